use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct GetArguments {
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("GET", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis GET command.
///
/// Retrieves the string stored under a key. An expired key is dropped on the
/// way and reads as missing.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - Exactly one string, the key to read
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The stored value
/// * `Ok(RespValue::NullBulkString)` - If the key is missing or expired
/// * `Err(CommandError::WrongType)` - If the key holds something other than a string
/// * `Err(CommandError::WrongNumberOfArguments)` - If there is not exactly one argument
///
/// # Examples
///
/// ```ignore
/// let result = get(&mut store, &["grape".into()]);
/// // Returns: Ok(RespValue::BulkString("mango")) or Ok(RespValue::NullBulkString)
/// ```
pub fn get(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    Ok(match store.get_string(&get_arguments.key)? {
        Some(value) => RespValue::BulkString(value.clone()),
        None => RespValue::NullBulkString,
    })
}
