//! Routes decoded commands for a session.
//!
//! Every request passes through [`Router::execute`], which applies the
//! connection's mode first (replica link, subscribed, transaction) and only
//! then looks the command up. Commands that need nothing but the key space
//! run as [`StoreHandler`]s under the store lock; a successful write is
//! propagated to replicas while that lock is still held, so replicas see
//! writes in the order they were applied here.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use jiff::Timestamp;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info};

use crate::{
    blocking::{BlockingCoordinator, PendingReply, WaitVariant},
    commands::{
        config_get, echo, info, is_known, ping, pop_first_available,
        pub_sub::{publish, subscribe, subscribed_ping, unsubscribe},
        read_streams,
        replication::{psync, ReplconfArguments, WaitArguments},
        resolve_start_ids, store_handler,
        transactions::{discard, exec, multi},
        BlpopArguments, Command, CommandError, CommandResult, StoreHandler, XreadArguments,
    },
    config::{Config, ConfigError},
    key_value_store::KeyValueStore,
    pub_sub::PubSub,
    rdb::{RdbError, RdbSnapshot},
    replication::{wait_for_replicas, ReplicationState, Role},
    resp::RespValue,
    session::{ClientId, Outbox, Session},
};

/// What a session may still send once it has subscribed to a channel.
const SUBSCRIBED_MODE_COMMANDS: [&str; 3] = ["SUBSCRIBE", "UNSUBSCRIBE", "PING"];

/// Where a command is being run from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExecutionMode {
    /// Directly for a client, which may be suspended.
    Client(ClientId),
    /// Queued by MULTI and run by EXEC; never blocks.
    Transaction,
    /// Received from this replica's master; never blocks nor propagates.
    Replicated,
}

impl ExecutionMode {
    fn blocking_client(self) -> Option<ClientId> {
        match self {
            ExecutionMode::Client(client) => Some(client),
            _ => None,
        }
    }

    fn propagates(self) -> bool {
        self != ExecutionMode::Replicated
    }
}

#[derive(Debug)]
pub struct Router {
    config: Config,
    role: Role,
    store: Arc<Mutex<KeyValueStore>>,
    pub_sub: Arc<Mutex<PubSub>>,
    replication: Arc<Mutex<ReplicationState>>,
    blocking: Arc<BlockingCoordinator>,
    next_client_id: AtomicU64,
}

impl Router {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let role = config.role()?;

        Ok(Self {
            replication: Arc::new(Mutex::new(ReplicationState::new(role.clone()))),
            role,
            config,
            store: Arc::new(Mutex::new(KeyValueStore::new())),
            pub_sub: Arc::new(Mutex::new(PubSub::new())),
            blocking: Arc::new(BlockingCoordinator::new()),
            next_client_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn store(&self) -> &Arc<Mutex<KeyValueStore>> {
        &self.store
    }

    pub fn replication(&self) -> &Arc<Mutex<ReplicationState>> {
        &self.replication
    }

    pub fn blocking(&self) -> &Arc<BlockingCoordinator> {
        &self.blocking
    }

    /// Creates the state of a newly accepted connection.
    pub fn new_session(&self, outbox: Outbox) -> Session {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        Session::new(id, outbox)
    }

    /// Decodes a snapshot and writes its keys into the store.
    pub async fn load_snapshot(&self, bytes: &[u8]) -> Result<usize, RdbError> {
        let snapshot = RdbSnapshot::parse(bytes)?;
        let loaded = snapshot.load_into(&mut *self.store.lock().await, Timestamp::now());

        info!(
            version = %snapshot.version,
            loaded,
            skipped = snapshot.entries.len() - loaded,
            "snapshot loaded"
        );

        Ok(loaded)
    }

    pub async fn execute(&self, session: &mut Session, command: Command) -> CommandResult {
        match self.route(session, command).await {
            Ok(result) => result,
            Err(error) => CommandResult::Response(error.as_resp()),
        }
    }

    /// Applies one command of the stream a master sends to this replica.
    ///
    /// Only `REPLCONF GETACK` produces something to send back: the offset
    /// processed so far, which does not yet include the GETACK itself.
    pub async fn apply_replicated(&self, input: RespValue) -> Option<RespValue> {
        let command = match Command::new(input) {
            Ok(command) => command,
            Err(error) => {
                debug!(%error, "ignoring malformed command from master");
                return None;
            }
        };

        if command.name() == "REPLCONF"
            && ReplconfArguments::parse(command.arguments()) == Ok(ReplconfArguments::GetAck)
        {
            let offset = self.replication.lock().await.replica_offset();

            return Some(RespValue::bulk_string_array([
                "REPLCONF".to_string(),
                "ACK".to_string(),
                offset.to_string(),
            ]));
        }

        if let Err(error) = self.dispatch(&command, ExecutionMode::Replicated).await {
            debug!(command = command.name(), %error, "replicated command failed");
        }

        None
    }

    /// Drops the blocked commands of `session`. Taking the store lock first
    /// means no waiter of this client is halfway through consuming a value.
    pub async fn cancel_blocked(&self, session: &Session) {
        let _store = self.store.lock().await;
        self.blocking.remove_client(session.id()).await;
    }

    /// Releases everything a closed connection still holds.
    pub async fn disconnect(&self, session: &Session) {
        let client = session.id();

        self.cancel_blocked(session).await;
        self.pub_sub.lock().await.remove_client(client);

        if self.replication.lock().await.remove_replica(client) {
            info!(%client, "replica link closed");
        }
    }

    async fn route(
        &self,
        session: &mut Session,
        command: Command,
    ) -> Result<CommandResult, CommandError> {
        if session.is_replica_link() {
            return Ok(self.replica_link_input(session, &command).await);
        }

        let name = command.name();

        if session.is_subscribed() && !SUBSCRIBED_MODE_COMMANDS.contains(&name) {
            return Err(CommandError::NotAllowedInSubscribedMode(
                name.to_lowercase(),
            ));
        }

        match name {
            "SUBSCRIBE" => {
                let mut pub_sub = self.pub_sub.lock().await;
                subscribe(session, &mut pub_sub, command.arguments()).map(CommandResult::Responses)
            }
            "UNSUBSCRIBE" => {
                let mut pub_sub = self.pub_sub.lock().await;
                unsubscribe(session, &mut pub_sub, command.arguments())
                    .map(CommandResult::Responses)
            }
            "MULTI" => multi(session, command.arguments()).map(CommandResult::from),
            "DISCARD" => discard(session, command.arguments()).map(CommandResult::from),
            "EXEC" => self.exec(session, command.arguments()).await,
            "PSYNC" => {
                let mut replication = self.replication.lock().await;
                psync(session, &mut replication, command.arguments())
            }
            "WAIT" => self.wait(command.arguments()).await,
            _ if session.in_transaction() => {
                if !is_known(name) {
                    return Err(CommandError::UnknownCommand(name.to_string()));
                }

                session.queue_command(command);
                Ok(RespValue::SimpleString("QUEUED".to_string()).into())
            }
            "PING" if session.is_subscribed() => {
                subscribed_ping(command.arguments()).map(CommandResult::from)
            }
            _ => {
                self.dispatch(&command, ExecutionMode::Client(session.id()))
                    .await
            }
        }
    }

    /// A replica link only ever reports how far it got.
    async fn replica_link_input(&self, session: &Session, command: &Command) -> CommandResult {
        if command.name() == "REPLCONF" {
            if let Ok(ReplconfArguments::Ack(offset)) = ReplconfArguments::parse(command.arguments())
            {
                debug!(client = %session.id(), offset, "replica acknowledged");
                self.replication.lock().await.record_ack(session.id(), offset);
            }
        }

        CommandResult::NoResponse
    }

    async fn dispatch(
        &self,
        command: &Command,
        mode: ExecutionMode,
    ) -> Result<CommandResult, CommandError> {
        self.check_writable(command, mode)?;

        match command.name() {
            "BLPOP" => self.blpop(command, mode).await,
            "XREAD" => self.xread(command.arguments(), mode).await,
            name => match store_handler(name) {
                Some(handler) => {
                    let mut store = self.store.lock().await;
                    let reply = self.run_store_command(&mut store, handler, command, mode).await?;
                    drop(store);

                    if command.is_write() {
                        self.blocking.wake();
                    }

                    Ok(reply.into())
                }
                None => self.server_command(command).await,
            },
        }
    }

    fn check_writable(&self, command: &Command, mode: ExecutionMode) -> Result<(), CommandError> {
        if command.is_write() && !self.is_master() && mode != ExecutionMode::Replicated {
            return Err(CommandError::ReadOnlyReplica);
        }

        Ok(())
    }

    /// Commands that never touch the key space.
    async fn server_command(&self, command: &Command) -> Result<CommandResult, CommandError> {
        let arguments = command.arguments();

        match command.name() {
            "PING" => ping(arguments).map(CommandResult::from),
            "ECHO" => echo(arguments).map(CommandResult::from),
            "INFO" => {
                let replication = self.replication.lock().await;
                info(&replication, arguments).map(CommandResult::from)
            }
            "CONFIG" => config_get(&self.config, arguments).map(CommandResult::from),
            "PUBLISH" => {
                let mut pub_sub = self.pub_sub.lock().await;
                publish(&mut pub_sub, arguments).map(CommandResult::from)
            }
            "REPLCONF" => match ReplconfArguments::parse(arguments)? {
                ReplconfArguments::Ack(_) => Ok(CommandResult::NoResponse),
                _ => Ok(RespValue::ok().into()),
            },
            name => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    /// Runs `handler` on a store the caller has locked. A write is
    /// propagated before the lock is released.
    async fn run_store_command(
        &self,
        store: &mut KeyValueStore,
        handler: StoreHandler,
        command: &Command,
        mode: ExecutionMode,
    ) -> Result<RespValue, CommandError> {
        let reply = handler(store, command.arguments())?;

        if command.is_write() {
            self.propagate(command, mode).await;
        }

        Ok(reply)
    }

    /// Forwards an applied write to every replica. Callers hold the store lock.
    async fn propagate(&self, command: &Command, mode: ExecutionMode) {
        if self.is_master() && mode.propagates() {
            self.replication.lock().await.propagate(command.input());
        }
    }

    /// Runs the queued commands back to back under a single store lock, so no
    /// other client's command lands in between.
    async fn exec(
        &self,
        session: &mut Session,
        arguments: &[String],
    ) -> Result<CommandResult, CommandError> {
        let queued = exec(session, arguments)?;
        let mut replies = Vec::with_capacity(queued.len());

        let mut store = self.store.lock().await;

        for command in &queued {
            let reply = self
                .run_queued(&mut store, command)
                .await
                .unwrap_or_else(|error| error.as_resp());

            replies.push(reply);
        }

        drop(store);

        if queued.iter().any(Command::is_write) {
            self.blocking.wake();
        }

        debug!(client = %session.id(), commands = queued.len(), "transaction executed");

        Ok(RespValue::Array(replies).into())
    }

    /// One command of a transaction. Blocking commands answer right away.
    async fn run_queued(
        &self,
        store: &mut KeyValueStore,
        command: &Command,
    ) -> Result<RespValue, CommandError> {
        let mode = ExecutionMode::Transaction;
        self.check_writable(command, mode)?;

        match command.name() {
            "BLPOP" => {
                let BlpopArguments { keys, .. } = BlpopArguments::parse(command.arguments())?;

                Ok(self
                    .pop_now(store, command, &keys, mode)
                    .await?
                    .unwrap_or(RespValue::NullArray))
            }
            "XREAD" => {
                let xread_arguments = XreadArguments::parse(command.arguments())?;
                let streams = resolve_start_ids(store, &xread_arguments.streams)?;

                Ok(read_streams(store, &streams, xread_arguments.count)?
                    .unwrap_or(RespValue::NullArray))
            }
            name => match store_handler(name) {
                Some(handler) => self.run_store_command(store, handler, command, mode).await,
                None => Ok(match self.server_command(command).await? {
                    CommandResult::Response(reply) => reply,
                    CommandResult::Responses(values) => RespValue::Array(values),
                    CommandResult::NoResponse | CommandResult::Pending(_) => {
                        RespValue::NullBulkString
                    }
                }),
            },
        }
    }

    /// The non-blocking half of BLPOP. Clients already queued on these keys
    /// are served first, except for commands replayed from the master.
    async fn pop_now(
        &self,
        store: &mut KeyValueStore,
        command: &Command,
        keys: &[String],
        mode: ExecutionMode,
    ) -> Result<Option<RespValue>, CommandError> {
        if mode != ExecutionMode::Replicated && self.blocking.has_waiters(keys).await {
            return Ok(None);
        }

        let reply = pop_first_available(store, keys)?;

        if reply.is_some() {
            self.propagate(command, mode).await;
        }

        Ok(reply)
    }

    async fn blpop(
        &self,
        command: &Command,
        mode: ExecutionMode,
    ) -> Result<CommandResult, CommandError> {
        let BlpopArguments { keys, timeout } = BlpopArguments::parse(command.arguments())?;

        {
            let mut store = self.store.lock().await;

            if let Some(reply) = self.pop_now(&mut store, command, &keys, mode).await? {
                return Ok(reply.into());
            }
        }

        let Some(client) = mode.blocking_client() else {
            return Ok(RespValue::NullArray.into());
        };

        let store = Arc::clone(&self.store);
        let replication = Arc::clone(&self.replication);
        let input = command.input().clone();
        let propagate = self.is_master();

        let pending = self
            .blocking
            .block_client(
                client,
                keys,
                timeout,
                WaitVariant::Keyed,
                RespValue::NullArray,
                move |ready_keys| {
                    let store = Arc::clone(&store);
                    let replication = Arc::clone(&replication);
                    let input = input.clone();

                    async move {
                        let mut store = store.lock().await;

                        match pop_first_available(&mut store, &ready_keys) {
                            Ok(Some(reply)) => {
                                if propagate {
                                    replication.lock().await.propagate(&input);
                                }
                                Some(reply)
                            }
                            Ok(None) => None,
                            Err(error) => Some(error.as_resp()),
                        }
                    }
                },
            )
            .await;

        Ok(CommandResult::Pending(pending))
    }

    async fn xread(
        &self,
        arguments: &[String],
        mode: ExecutionMode,
    ) -> Result<CommandResult, CommandError> {
        let xread_arguments = XreadArguments::parse(arguments)?;

        let streams = {
            let mut store = self.store.lock().await;
            let streams = resolve_start_ids(&mut store, &xread_arguments.streams)?;

            if let Some(reply) = read_streams(&mut store, &streams, xread_arguments.count)? {
                return Ok(reply.into());
            }

            streams
        };

        let (Some(block), Some(client)) = (xread_arguments.block, mode.blocking_client()) else {
            return Ok(RespValue::NullArray.into());
        };

        let timeout = (!block.is_zero()).then_some(block);
        let keys = streams.iter().map(|(key, _)| key.clone()).collect();
        let store = Arc::clone(&self.store);
        let count = xread_arguments.count;

        let pending = self
            .blocking
            .block_client(
                client,
                keys,
                timeout,
                WaitVariant::Stream,
                RespValue::NullArray,
                move |_| {
                    let store = Arc::clone(&store);
                    let streams = streams.clone();

                    async move {
                        let mut store = store.lock().await;

                        match read_streams(&mut store, &streams, count) {
                            Ok(reply) => reply,
                            Err(error) => Some(error.as_resp()),
                        }
                    }
                },
            )
            .await;

        Ok(CommandResult::Pending(pending))
    }

    /// Replies later with the number of replicas that acknowledged every
    /// write propagated before the WAIT.
    async fn wait(&self, arguments: &[String]) -> Result<CommandResult, CommandError> {
        let WaitArguments { replicas, timeout } = WaitArguments::parse(arguments)?;

        if !self.is_master() {
            return Ok(RespValue::Integer(0).into());
        }

        let (sender, receiver) = oneshot::channel();
        let replication = Arc::clone(&self.replication);

        tokio::spawn(async move {
            let synced = wait_for_replicas(replication, replicas, timeout).await;
            let _ = sender.send(RespValue::Integer(synced as i64));
        });

        Ok(CommandResult::Pending(PendingReply::new(receiver)))
    }

    fn is_master(&self) -> bool {
        self.role == Role::Master
    }
}
