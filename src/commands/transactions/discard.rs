use crate::{
    commands::{command_utils::check_arity, CommandError},
    resp::RespValue,
    session::Session,
};

/// Drops every queued command without running any of them.
pub fn discard(session: &mut Session, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("DISCARD", arguments, 0, Some(0))?;
    session.discard_transaction()?;

    Ok(RespValue::ok())
}
