//! Master/replica replication.
//!
//! [`ReplicationState`] is shared by both roles. A master uses it as the
//! registry of replica links and owns the master offset; a replica uses it to
//! count the bytes consumed from its master. The two offsets are separate
//! counters and are only ever compared, never merged.

mod master;
mod replica;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use tracing::{debug, info};

use crate::{
    resp::RespValue,
    session::{ClientId, Outbox},
};

pub use master::{full_resync_payload, wait_for_replicas, WAIT_POLL_INTERVAL};
pub use replica::{connect_to_master, ReplicationError};

/// Canonical empty snapshot sent to a replica during full resynchronization.
pub const EMPTY_RDB: [u8; 88] = [
    0x52, 0x45, 0x44, 0x49, 0x53, 0x30, 0x30, 0x31, 0x31, 0xfa, 0x09, 0x72, 0x65, 0x64, 0x69,
    0x73, 0x2d, 0x76, 0x65, 0x72, 0x05, 0x37, 0x2e, 0x32, 0x2e, 0x30, 0xfa, 0x0a, 0x72, 0x65,
    0x64, 0x69, 0x73, 0x2d, 0x62, 0x69, 0x74, 0x73, 0xc0, 0x40, 0xfa, 0x05, 0x63, 0x74, 0x69,
    0x6d, 0x65, 0xc2, 0x6d, 0x08, 0xbc, 0x65, 0xfa, 0x08, 0x75, 0x73, 0x65, 0x64, 0x2d, 0x6d,
    0x65, 0x6d, 0xc2, 0xb0, 0xc4, 0x10, 0x00, 0xfa, 0x08, 0x61, 0x6f, 0x66, 0x2d, 0x62, 0x61,
    0x73, 0x65, 0xc0, 0x00, 0xff, 0xf0, 0x6e, 0x3b, 0xfe, 0xc0, 0xff, 0x5a, 0xa2,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Master,
    Replica { host: String, port: u16 },
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Replica { .. } => "slave",
        }
    }
}

#[derive(Debug)]
pub struct ReplicaLink {
    outbox: Outbox,
    /// Master offset at the moment this replica was fully resynchronized.
    base_offset: u64,
    acked_offset: u64,
}

impl ReplicaLink {
    pub fn acked_offset(&self) -> u64 {
        self.acked_offset
    }

    fn is_synced(&self, master_offset: u64) -> bool {
        self.base_offset + self.acked_offset >= master_offset
    }
}

#[derive(Debug)]
pub struct ReplicationState {
    role: Role,
    repl_id: String,
    master_offset: u64,
    replica_offset: u64,
    links: BTreeMap<ClientId, ReplicaLink>,
}

impl ReplicationState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            repl_id: generate_replication_id(),
            master_offset: 0,
            replica_offset: 0,
            links: BTreeMap::new(),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    pub fn repl_id(&self) -> &str {
        &self.repl_id
    }

    /// Adopts the id announced by a master in its FULLRESYNC line.
    pub fn set_repl_id(&mut self, repl_id: &str) {
        self.repl_id = repl_id.to_string();
    }

    pub fn master_offset(&self) -> u64 {
        self.master_offset
    }

    pub fn replica_offset(&self) -> u64 {
        self.replica_offset
    }

    pub fn advance_replica_offset(&mut self, bytes: usize) {
        self.replica_offset += bytes as u64;
    }

    pub fn register_replica(&mut self, client: ClientId, outbox: Outbox) {
        info!(%client, replicas = self.links.len() + 1, "replica registered");

        self.links.insert(
            client,
            ReplicaLink {
                outbox,
                base_offset: self.master_offset,
                acked_offset: 0,
            },
        );
    }

    pub fn remove_replica(&mut self, client: ClientId) -> bool {
        let removed = self.links.remove(&client).is_some();

        if removed {
            info!(%client, replicas = self.links.len(), "replica removed");
        }

        removed
    }

    pub fn replica(&self, client: ClientId) -> Option<&ReplicaLink> {
        self.links.get(&client)
    }

    pub fn replica_count(&self) -> usize {
        self.links.len()
    }

    /// Forwards a write command verbatim to every replica link.
    ///
    /// The master offset grows by the encoded length once, however many
    /// replicas there are. Nothing is counted while no replica is attached.
    pub fn propagate(&mut self, command: &RespValue) {
        if self.links.is_empty() {
            return;
        }

        let encoded = command.to_bytes();
        self.master_offset += encoded.len() as u64;

        for (client, link) in &self.links {
            if link.outbox.send(encoded.clone()).is_err() {
                debug!(%client, "replica link closed before propagation");
            }
        }
    }

    /// Records a `REPLCONF ACK`. Offsets never move backwards.
    pub fn record_ack(&mut self, client: ClientId, offset: u64) {
        if let Some(link) = self.links.get_mut(&client) {
            link.acked_offset = link.acked_offset.max(offset);
        }
    }

    pub fn synced_replica_count(&self) -> usize {
        self.links
            .values()
            .filter(|link| link.is_synced(self.master_offset))
            .count()
    }

    /// Sends `REPLCONF GETACK *` to every replica.
    pub fn request_acks(&self) {
        let getack = RespValue::bulk_string_array(["REPLCONF", "GETACK", "*"]).to_bytes();

        for link in self.links.values() {
            let _ = link.outbox.send(getack.clone());
        }
    }

    /// Body of the `INFO replication` section.
    pub fn info(&self) -> String {
        let offset = match self.role {
            Role::Master => self.master_offset,
            Role::Replica { .. } => self.replica_offset,
        };

        let mut lines = vec![
            "# Replication".to_string(),
            format!("role:{}", self.role.name()),
        ];

        if self.is_master() {
            lines.push(format!("connected_slaves:{}", self.links.len()));
        }

        lines.push(format!("master_replid:{}", self.repl_id));
        lines.push(format!("master_repl_offset:{}", offset));

        lines.join("\r\n")
    }
}

const REPL_ID_LENGTH: usize = 40;

static REPL_ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{40}$").ok());

/// Random 40 character alphanumeric id.
pub fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPL_ID_LENGTH)
        .map(char::from)
        .collect()
}

pub fn is_valid_repl_id(repl_id: &str) -> bool {
    REPL_ID_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(repl_id))
}
