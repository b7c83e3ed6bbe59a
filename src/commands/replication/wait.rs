use std::time::Duration;

use crate::commands::{
    command_utils::{check_arity, parse_integer},
    CommandError,
};

/// `WAIT numreplicas timeout`
#[derive(Debug, PartialEq)]
pub struct WaitArguments {
    pub replicas: usize,
    pub timeout: Duration,
}

impl WaitArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("WAIT", arguments, 2, Some(2))?;

        let timeout = parse_integer::<i64>(&arguments[1])?;

        if timeout < 0 {
            return Err(CommandError::NegativeTimeout);
        }

        Ok(Self {
            replicas: parse_integer(&arguments[0])?,
            timeout: Duration::from_millis(timeout as u64),
        })
    }
}
