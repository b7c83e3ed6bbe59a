use crate::{
    commands::{command_utils::check_arity, CommandError},
    resp::RespValue,
    session::Session,
};

pub fn multi(session: &mut Session, arguments: &[String]) -> Result<RespValue, CommandError> {
    check_arity("MULTI", arguments, 0, Some(0))?;
    session.start_transaction()?;

    Ok(RespValue::ok())
}
