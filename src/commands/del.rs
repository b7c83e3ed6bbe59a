use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handles the Redis DEL command.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - One or more keys to remove
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - How many of the keys existed and were removed
/// * `Err(CommandError::WrongNumberOfArguments)` - If no key is given
///
/// # Examples
///
/// ```ignore
/// let result = del(&mut store, &["grape".into(), "missing".into()]);
/// // Returns: Ok(RespValue::Integer(1))
/// ```
pub fn del(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("DEL", arguments, 1, None)?;

    let removed = arguments.iter().filter(|key| store.remove(key)).count();

    Ok(RespValue::Integer(removed as i64))
}
