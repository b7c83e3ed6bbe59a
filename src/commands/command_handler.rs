use crate::{blocking::PendingReply, commands::CommandError, resp::RespValue};

/// Commands whose effects are forwarded to replicas.
pub const WRITE_COMMANDS: [&str; 11] = [
    "SET", "DEL", "INCR", "LPUSH", "RPUSH", "LPOP", "BLPOP", "XADD", "ZADD", "ZREM", "GEOADD",
];

/// Outcome of running one command for a session.
#[derive(Debug)]
pub enum CommandResult {
    /// Nothing is written back (replica links, PSYNC after its own frames).
    NoResponse,
    Response(RespValue),
    /// Several replies for one request, as SUBSCRIBE sends one per channel.
    Responses(Vec<RespValue>),
    /// Delivered later by a blocked command or WAIT.
    Pending(PendingReply),
}

impl From<RespValue> for CommandResult {
    fn from(value: RespValue) -> Self {
        CommandResult::Response(value)
    }
}

/// A decoded request: upper-cased name, its arguments, and the frame it came
/// from so it can be propagated byte for byte.
#[derive(Debug, PartialEq, Clone)]
pub struct Command {
    name: String,
    arguments: Vec<String>,
    input: RespValue,
}

impl Command {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommandFormat);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(part) => parts.push(part.clone()),
                _ => return Err(CommandError::InvalidCommandFormat),
            }
        }

        if parts.is_empty() {
            return Err(CommandError::InvalidCommandFormat);
        }

        let name = parts.remove(0).to_uppercase();

        Ok(Self {
            name,
            arguments: parts,
            input,
        })
    }

    pub fn from_parts(parts: &[&str]) -> Result<Self, CommandError> {
        Self::new(RespValue::bulk_string_array(parts.iter().copied()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn input(&self) -> &RespValue {
        &self.input
    }

    pub fn is_write(&self) -> bool {
        WRITE_COMMANDS.contains(&self.name.as_str())
    }
}
