use std::time::Duration;

use tokio::time::Instant;

use crate::{
    commands::{
        command_utils::{check_arity, parse_integer},
        CommandError,
    },
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
pub struct SetArguments {
    /// The key name to write
    key: String,
    /// The value to be stored under the given key
    value: String,
    /// Time to live requested with `PX` or `EX`
    time_to_live: Option<Duration>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The command arguments in one of these shapes:
    ///   - `[key, value]` - For permanent storage
    ///   - `[key, value, "PX", milliseconds]` - Expires after the given milliseconds
    ///   - `[key, value, "EX", seconds]` - Expires after the given seconds
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If there are fewer than 2 arguments
    /// * `Err(CommandError::SyntaxError)` - If the option is neither `PX` nor `EX`
    /// * `Err(CommandError::NotAnInteger)` - If the expiration is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiration is not positive or overflows
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SetArguments::parse(&["mykey".into(), "hello".into(), "PX".into(), "1000".into()]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", time_to_live: Some(1s) })
    /// ```
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("SET", arguments, 2, None)?;

        let time_to_live = match &arguments[2..] {
            [] => None,
            [option, amount] => {
                let amount = parse_integer::<i64>(amount)?;

                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime("set".to_string()));
                }

                let milliseconds = match option.to_uppercase().as_str() {
                    "PX" => Some(amount),
                    "EX" => amount.checked_mul(1000),
                    _ => return Err(CommandError::SyntaxError),
                }
                .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?;

                Some(Duration::from_millis(milliseconds as u64))
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            time_to_live,
        })
    }
}

/// Handles the Redis SET command.
///
/// Stores a string under the key, replacing whatever value and expiry the key
/// held before.
///
/// # Arguments
///
/// * `store` - The key space to write into
/// * `arguments` - `[key, value]`, optionally followed by `PX milliseconds` or `EX seconds`
///
/// # Returns
///
/// * `Ok(RespValue::SimpleString("OK"))` - The value was stored
/// * `Err(CommandError::InvalidExpireTime)` - If the expiry lies beyond what the clock can represent
/// * `Err(CommandError)` - Any error of [`SetArguments::parse`]
///
/// # Examples
///
/// ```ignore
/// let result = set(&mut store, &["grape".into(), "mango".into(), "EX".into(), "10".into()]);
/// // Returns: Ok(RespValue::SimpleString("OK")), "grape" expires in 10 seconds
/// ```
pub fn set(store: &mut KeyValueStore, arguments: &[String]) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;
    let expiration = set_arguments
        .time_to_live
        .map(|time_to_live| {
            Instant::now()
                .checked_add(time_to_live)
                .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))
        })
        .transpose()?;

    store.insert(
        set_arguments.key,
        Value::with_expiration(DataType::String(set_arguments.value), expiration),
    );

    Ok(RespValue::ok())
}
