use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::{KeyValueStore, Stream, StreamFields, StreamId},
    resp::RespValue,
};

pub struct XaddArguments {
    key: String,
    id: String,
    fields: StreamFields,
}

impl XaddArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("XADD", arguments, 4, None)?;

        let pairs = &arguments[2..];

        if pairs.len() % 2 != 0 {
            return Err(CommandError::wrong_arguments("XADD"));
        }

        Ok(Self {
            key: arguments[0].clone(),
            id: arguments[1].clone(),
            fields: pairs
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
        })
    }
}

/// Handles the Redis XADD command.
///
/// The id may be explicit (`<ms>-<seq>`), have a generated sequence
/// (`<ms>-*`) or be fully generated (`*`, from the wall clock). It must be
/// greater than `0-0` and than the current top of the stream. The key is only
/// created once an entry is actually appended.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, id, field, value, ...]` with at least one field/value pair
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The id the entry was stored under
/// * `Err(CommandError::StreamIdZero)` - If the id is `0-0`
/// * `Err(CommandError::StreamIdTooSmall)` - If the id is not above the stream's top id
/// * `Err(CommandError::InvalidStreamId)` - If the id cannot be parsed
///
/// # Examples
///
/// ```ignore
/// let result = xadd(&mut store, &["weather".into(), "1-*".into(), "temperature".into(), "21".into()]);
/// // Returns: Ok(RespValue::BulkString("1-0"))
/// ```
pub fn xadd(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;
    let now_ms = jiff::Timestamp::now().as_millisecond().max(0) as u64;

    let id = match store.get_stream(&xadd_arguments.key)? {
        Some(stream) => stream.resolve_id(&xadd_arguments.id, now_ms)?,
        None => Stream::default().resolve_id(&xadd_arguments.id, now_ms)?,
    };

    if id == StreamId::MIN {
        return Err(CommandError::StreamIdZero);
    }

    let id = store
        .get_stream_or_default(&xadd_arguments.key)?
        .append(id, xadd_arguments.fields)?;

    Ok(RespValue::BulkString(id.to_string()))
}
