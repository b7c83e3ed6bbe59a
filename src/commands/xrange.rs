use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        stream_utils::{entries_to_resp, parse_range_id},
        CommandError,
    },
    key_value_store::{KeyValueStore, StreamId},
    resp::RespValue,
};

pub struct XrangeArguments {
    key: String,
    start: StreamId,
    end: StreamId,
    count: Option<usize>,
}

impl XrangeArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("XRANGE", arguments, 3, Some(5))?;

        let count = match &arguments[3..] {
            [] => None,
            [option, count] if option.eq_ignore_ascii_case("COUNT") => {
                Some(parse_integer::<usize>(count)?)
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            start: parse_range_id(&arguments[1], 0)?,
            end: parse_range_id(&arguments[2], u64::MAX)?,
            count,
        })
    }
}

/// Handles the Redis XRANGE command.
///
/// Inclusive range of stream entries. A bare millisecond start covers the
/// whole millisecond, as does a bare millisecond end; `-` and `+` stand for
/// the lowest and highest ids.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, start, end]`, optionally followed by `COUNT n`
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - `[id, [field, value, ...]]` per entry
/// * `Err(CommandError::InvalidStreamId)` - If a bound cannot be parsed
/// * `Err(CommandError::WrongType)` - If the key holds something other than a stream
pub fn xrange(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let Some(stream) = store.get_stream(&xrange_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let mut entries = stream.range(xrange_arguments.start, xrange_arguments.end);

    if let Some(count) = xrange_arguments.count {
        entries.truncate(count);
    }

    Ok(entries_to_resp(entries))
}
