use std::time::Duration;

use crate::commands::{
    command_utils::{check_arity, parse_timeout_seconds},
    CommandError,
};

/// `BLPOP key [key ...] timeout`
#[derive(Debug, PartialEq)]
pub struct BlpopArguments {
    pub keys: Vec<String>,
    /// `None` blocks until an element arrives.
    pub timeout: Option<Duration>,
}

impl BlpopArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("BLPOP", arguments, 2, None)?;

        let (timeout, keys) = arguments
            .split_last()
            .ok_or_else(|| CommandError::wrong_arguments("BLPOP"))?;

        Ok(Self {
            keys: keys.to_vec(),
            timeout: parse_timeout_seconds(timeout)?,
        })
    }
}
