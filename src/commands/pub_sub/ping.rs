use crate::{
    commands::{command_utils::check_arity, CommandError},
    resp::RespValue,
};

/// PING while subscribed replies `["pong", message]`, with an empty message
/// when none was given.
pub fn subscribed_ping(arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("PING", arguments, 0, Some(1))?;

    let message = arguments.first().cloned().unwrap_or_default();

    Ok(RespValue::bulk_string_array(["pong".to_string(), message]))
}
