//! PSYNC on the master side. Only full resynchronization exists: whatever id
//! and offset the replica asks for, it receives the current replication id and
//! offset followed by a snapshot.

use tracing::info;

use crate::{
    commands::{command_utils::check_arity, CommandError, CommandResult},
    replication::{full_resync_payload, ReplicationState, EMPTY_RDB},
    session::Session,
};

pub struct PsyncArguments {
    pub repl_id: String,
    pub offset: i64,
}

impl PsyncArguments {
    pub fn parse(arguments: &[String]) -> Result<Self, CommandError> {
        check_arity("PSYNC", arguments, 2, Some(2))?;

        Ok(Self {
            repl_id: arguments[0].clone(),
            offset: arguments[1]
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?,
        })
    }
}

/// Sends `+FULLRESYNC <id> <offset>` and the snapshot frame, then turns the
/// session into a replica link. Both frames are queued while the replication
/// state is locked, so no propagated command can slip in between them and the
/// registration.
pub fn psync(
    session: &mut Session,
    replication: &mut ReplicationState,
    arguments: &[String],
) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;

    if !replication.is_master() {
        return Err(CommandError::PsyncOnReplica);
    }

    session.mark_replica_link()?;

    info!(
        client = %session.id(),
        requested_id = %psync_arguments.repl_id,
        requested_offset = psync_arguments.offset,
        "starting full resynchronization"
    );

    let (reply, snapshot) =
        full_resync_payload(replication.repl_id(), replication.master_offset(), &EMPTY_RDB);

    session.send(&reply);
    session.send_bytes(snapshot);
    replication.register_replica(session.id(), session.outbox().clone());

    Ok(CommandResult::NoResponse)
}
