//! Per-connection state.
//!
//! A [`Session`] is owned by the task serving its connection and is only ever
//! touched from there. Shared registries (pub/sub channels, replica links,
//! blocked waiters) refer back to it through its [`ClientId`] and drop their
//! entries when the connection closes.

use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{
    commands::{Command, CommandError},
    resp::RespValue,
};

/// Stable identifier assigned to a connection when it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Outbound byte queue of a connection, drained by its writer task.
pub type Outbox = mpsc::UnboundedSender<Bytes>;

#[derive(Debug)]
pub struct Session {
    id: ClientId,
    outbox: Outbox,
    transaction: Option<Vec<Command>>,
    subscriptions: Vec<String>,
    replica_link: bool,
}

impl Session {
    pub fn new(id: ClientId, outbox: Outbox) -> Self {
        Self {
            id,
            outbox,
            transaction: None,
            subscriptions: Vec::new(),
            replica_link: false,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Queues `value` for the client. Returns `false` once the connection is gone.
    pub fn send(&self, value: &RespValue) -> bool {
        self.outbox.send(value.to_bytes()).is_ok()
    }

    pub fn send_bytes(&self, bytes: Bytes) -> bool {
        self.outbox.send(bytes).is_ok()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn start_transaction(&mut self) -> Result<(), CommandError> {
        if self.in_transaction() {
            return Err(CommandError::NestedMulti);
        }

        self.transaction = Some(Vec::new());
        Ok(())
    }

    pub fn queue_command(&mut self, command: Command) {
        if let Some(queue) = self.transaction.as_mut() {
            queue.push(command);
        }
    }

    pub fn take_transaction(&mut self) -> Result<Vec<Command>, CommandError> {
        self.transaction.take().ok_or(CommandError::ExecWithoutMulti)
    }

    pub fn discard_transaction(&mut self) -> Result<(), CommandError> {
        self.transaction
            .take()
            .map(|_| ())
            .ok_or(CommandError::DiscardWithoutMulti)
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Adds `channel` and returns the number of channels now subscribed.
    pub fn subscribe(&mut self, channel: &str) -> usize {
        if !self.subscriptions.iter().any(|existing| existing == channel) {
            self.subscriptions.push(channel.to_string());
        }

        self.subscriptions.len()
    }

    pub fn unsubscribe(&mut self, channel: &str) -> usize {
        self.subscriptions.retain(|existing| existing != channel);
        self.subscriptions.len()
    }

    pub fn is_replica_link(&self) -> bool {
        self.replica_link
    }

    pub fn mark_replica_link(&mut self) -> Result<(), CommandError> {
        if self.in_transaction() {
            return Err(CommandError::NotAllowedInTransaction);
        }

        self.replica_link = true;
        Ok(())
    }
}
