use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handles the Redis LLEN command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - Exactly one string, the list key
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The length of the list, `0` for a missing key
/// * `Err(CommandError::WrongType)` - If the key holds something other than a list
/// * `Err(CommandError::WrongNumberOfArguments)` - If there is not exactly one argument
pub fn llen(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("LLEN", arguments, 1, Some(1))?;

    let length = store.get_list(&arguments[0])?.map_or(0, |list| list.len());

    Ok(RespValue::Integer(length as i64))
}
