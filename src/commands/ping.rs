use crate::{
    commands::{command_utils::check_arity, CommandError},
    resp::RespValue,
};

/// `PING` answers `PONG`; `PING <message>` echoes the message back.
pub fn ping(arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("PING", arguments, 0, Some(1))?;

    Ok(match arguments.first() {
        Some(message) => RespValue::BulkString(message.clone()),
        None => RespValue::SimpleString("PONG".to_string()),
    })
}
