use crate::{
    commands::{command_utils::check_arity, CommandError},
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

pub struct IncrArguments {
    key: String,
}

impl IncrArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("INCR", arguments, 1, Some(1))?;

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis INCR command.
///
/// Adds one to the integer stored under a key. A missing key counts as `0`.
/// The key keeps its expiry.
///
/// # Arguments
///
/// * `store` - The key space
/// * `arguments` - Exactly one string, the key to increment
///
/// # Returns
///
/// * `Ok(RespValue::Integer)` - The value after the increment
/// * `Err(CommandError::NotAnInteger)` - If the value is not an integer or would overflow
/// * `Err(CommandError::WrongType)` - If the key holds something other than a string
///
/// # Examples
///
/// ```ignore
/// let result = incr(&mut store, &["counter".into()]);
/// // Returns: Ok(RespValue::Integer(1)) when "counter" did not exist
/// ```
pub fn incr(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments)?;

    let next = match store.get_string(&incr_arguments.key)? {
        Some(current) => current
            .parse::<i64>()
            .ok()
            .and_then(|current| current.checked_add(1))
            .ok_or(CommandError::NotAnInteger)?,
        None => 1,
    };

    match store.get_mut(&incr_arguments.key) {
        Some(value) => value.data = DataType::String(next.to_string()),
        None => store.insert(
            incr_arguments.key,
            Value::new(DataType::String(next.to_string())),
        ),
    }

    Ok(RespValue::Integer(next))
}
