use crate::{
    commands::{
        command_utils::{check_arity, normalize_range, parse_integer},
        CommandError,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct LrangeArguments {
    key: String,
    start: i64,
    stop: i64,
}

impl LrangeArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("LRANGE", arguments, 3, Some(3))?;

        Ok(Self {
            key: arguments[0].clone(),
            start: parse_integer(&arguments[1])?,
            stop: parse_integer(&arguments[2])?,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - `[key, start, stop]`, an inclusive range where negative
///   indexes count from the tail
///
/// # Returns
///
/// * `Ok(RespValue::Array)` - The selected elements, empty when the range selects nothing
/// * `Err(CommandError::NotAnInteger)` - If `start` or `stop` is not an integer
/// * `Err(CommandError::WrongType)` - If the key holds something other than a list
///
/// # Examples
///
/// ```ignore
/// let result = lrange(&mut store, &["fruits".into(), "0".into(), "-1".into()]);
/// // Returns: Ok(RespValue::Array(["apple", "pear"]))
/// ```
pub fn lrange(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let Some(list) = store.get_list(&lrange_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()));
    };

    let Some((start, stop)) = normalize_range(list.len(), lrange_arguments.start, lrange_arguments.stop)
    else {
        return Ok(RespValue::Array(Vec::new()));
    };

    Ok(RespValue::bulk_string_array(
        list.range(start..=stop).cloned(),
    ))
}
