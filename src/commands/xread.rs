use std::time::Duration;

use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        stream_utils::{entries_to_resp, parse_range_id},
        CommandError,
    },
    key_value_store::{KeyValueStore, StreamId},
    resp::RespValue,
};

/// `XREAD [COUNT n] [BLOCK ms] STREAMS key [key ...] id [id ...]`
#[derive(Debug, PartialEq)]
pub struct XreadArguments {
    pub count: Option<usize>,
    /// `Some(Duration::ZERO)` blocks without a deadline.
    pub block: Option<Duration>,
    /// Stream keys paired with the id given for them, `$` still unresolved.
    pub streams: Vec<(String, String)>,
}

impl XreadArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("XREAD", arguments, 3, None)?;

        let mut count = None;
        let mut block = None;
        let mut position = 0;

        loop {
            let option = arguments
                .get(position)
                .ok_or(CommandError::SyntaxError)?
                .to_uppercase();

            match option.as_str() {
                "STREAMS" => {
                    position += 1;
                    break;
                }
                "COUNT" | "BLOCK" => {
                    let value = arguments.get(position + 1).ok_or(CommandError::SyntaxError)?;

                    if option == "COUNT" {
                        count = Some(parse_integer::<usize>(value)?);
                    } else {
                        let milliseconds =
                            parse_integer::<i64>(value).map_err(|_| CommandError::InvalidTimeout)?;

                        if milliseconds < 0 {
                            return Err(CommandError::NegativeTimeout);
                        }

                        block = Some(Duration::from_millis(milliseconds as u64));
                    }

                    position += 2;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[position..];

        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandError::wrong_arguments("XREAD"));
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);

        Ok(Self {
            count,
            block,
            streams: keys.iter().cloned().zip(ids.iter().cloned()).collect(),
        })
    }
}

/// Resolves each requested id; `$` becomes the stream's current top id so
/// that only entries added later are returned.
pub fn resolve_start_ids(
    store: &mut KeyValueStore,
    streams: &[(String, String)],
) -> Result<Vec<(String, StreamId)>, CommandError> {
    streams
        .iter()
        .map(|(key, id)| -> Result<(String, StreamId), CommandError> {
            let start = if id == "$" {
                store
                    .get_stream(key)?
                    .map_or(StreamId::MIN, |stream| stream.last_id())
            } else {
                parse_range_id(id, 0)?
            };

            Ok((key.clone(), start))
        })
        .collect()
}

/// `[[key, entries], ...]` for every stream with entries newer than its start
/// id, or `None` when there are none at all.
pub fn read_streams(
    store: &mut KeyValueStore,
    streams: &[(String, StreamId)],
    count: Option<usize>,
) -> Result<Option<RespValue>, CommandError> {
    let mut reply = Vec::new();

    for (key, start) in streams {
        let Some(stream) = store.get_stream(key)? else {
            continue;
        };

        let mut entries = stream.read_after(*start);

        if let Some(count) = count {
            entries.truncate(count);
        }

        if !entries.is_empty() {
            reply.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(entries),
            ]));
        }
    }

    Ok((!reply.is_empty()).then_some(RespValue::Array(reply)))
}
