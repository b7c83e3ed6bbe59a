use crate::commands::{command_utils::check_arity, CommandError};

#[derive(Debug, PartialEq)]
pub enum ReplconfArguments {
    ListeningPort(u16),
    Capabilities(Vec<String>),
    /// `GETACK *`, sent by a master to its replicas.
    GetAck,
    /// `ACK <offset>`, sent by a replica to its master.
    Ack(u64),
}

impl ReplconfArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("REPLCONF", arguments, 2, None)?;

        let option = arguments[0].to_lowercase();

        match (option.as_str(), &arguments[1..]) {
            ("listening-port", [port]) => port
                .parse::<u16>()
                .map(ReplconfArguments::ListeningPort)
                .map_err(|_| CommandError::NotAnInteger),
            ("capa", capabilities) => Ok(ReplconfArguments::Capabilities(capabilities.to_vec())),
            ("getack", [_]) => Ok(ReplconfArguments::GetAck),
            ("ack", [offset]) => offset
                .parse::<u64>()
                .map(ReplconfArguments::Ack)
                .map_err(|_| CommandError::NotAnInteger),
            _ => Err(CommandError::SyntaxError),
        }
    }
}
