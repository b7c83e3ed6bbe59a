use crate::{
    commands::{command_utils::check_arity, Command, CommandError},
    session::Session,
};

/// Closes the transaction and hands back the queued commands, in the order
/// they were received, for the router to run.
pub fn exec(session: &mut Session, arguments: &[String]) -> Result<Vec<Command>, CommandError> {
    check_arity("EXEC", arguments, 0, Some(0))?;

    session.take_transaction()
}
