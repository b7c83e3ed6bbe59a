use crate::{
    commands::{command_utils::check_arity, CommandError},
    resp::RespValue,
};

/// Handles the Redis ECHO command.
///
/// # Arguments
///
/// * `arguments` - Exactly one string, the message
///
/// # Returns
///
/// * `Ok(RespValue::BulkString)` - The message unchanged
/// * `Err(CommandError::WrongNumberOfArguments)` - If there is not exactly one argument
pub fn echo(arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("ECHO", arguments, 1, Some(1))?;

    Ok(RespValue::BulkString(arguments[0].clone()))
}
