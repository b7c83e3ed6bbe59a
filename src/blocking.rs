//! Suspended replies for blocking commands.
//!
//! A blocked client is registered as a waiter on every key it watches. Each
//! waiter is driven by its own task that re-checks on a fixed poll interval,
//! and earlier whenever a write calls [`BlockingCoordinator::wake`]. For the
//! keyed variant (BLPOP) only the waiter at the head of a key's queue may run
//! its check against that key, so waiters are served strictly in the order
//! they arrived. The stream variant (XREAD) never consumes anything and checks
//! all of its streams at once.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{oneshot, Mutex, Notify},
    task::AbortHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::{resp::RespValue, session::ClientId};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitVariant {
    /// Check one key at a time, only while first in that key's queue.
    Keyed,
    /// Check every watched stream together.
    Stream,
}

/// Reply that will be delivered later.
#[derive(Debug)]
pub struct PendingReply {
    receiver: oneshot::Receiver<RespValue>,
}

impl PendingReply {
    pub fn new(receiver: oneshot::Receiver<RespValue>) -> Self {
        Self { receiver }
    }

    /// Resolves to `None` if the waiter was cancelled.
    pub async fn resolve(self) -> Option<RespValue> {
        self.receiver.await.ok()
    }

    /// Like [`PendingReply::resolve`] but keeps the reply pending, so the
    /// waiter stays alive while the caller deregisters it.
    pub async fn recv(&mut self) -> Option<RespValue> {
        (&mut self.receiver).await.ok()
    }
}

type WaiterId = u64;

#[derive(Debug)]
struct Waiter {
    client: ClientId,
    keys: Vec<String>,
    task: Option<AbortHandle>,
}

#[derive(Debug, Default)]
struct WaiterRegistry {
    next_id: WaiterId,
    queues: HashMap<String, VecDeque<WaiterId>>,
    waiters: HashMap<WaiterId, Waiter>,
}

impl WaiterRegistry {
    fn register(&mut self, client: ClientId, keys: &[String]) -> WaiterId {
        let id = self.next_id;
        self.next_id += 1;

        for key in keys {
            self.queues.entry(key.clone()).or_default().push_back(id);
        }

        self.waiters.insert(
            id,
            Waiter {
                client,
                keys: keys.to_vec(),
                task: None,
            },
        );

        id
    }

    fn deregister(&mut self, id: WaiterId) -> Option<Waiter> {
        let waiter = self.waiters.remove(&id)?;

        for key in &waiter.keys {
            if let Some(queue) = self.queues.get_mut(key) {
                queue.retain(|queued| *queued != id);

                if queue.is_empty() {
                    self.queues.remove(key);
                }
            }
        }

        Some(waiter)
    }

    fn is_head(&self, id: WaiterId, key: &str) -> bool {
        self.queues
            .get(key)
            .and_then(|queue| queue.front())
            .is_some_and(|head| *head == id)
    }
}

#[derive(Debug, Default)]
pub struct BlockingCoordinator {
    registry: Mutex<WaiterRegistry>,
    wake: Notify,
}

impl BlockingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends a reply until `check` yields a value or `timeout` elapses.
    ///
    /// `check` receives the keys this waiter may currently act on and must
    /// return `Some(reply)` once it has served the client. On timeout the
    /// client gets `timeout_reply`. `None` as timeout blocks without limit.
    pub async fn block_client<F, Fut>(
        self: &Arc<Self>,
        client: ClientId,
        keys: Vec<String>,
        timeout: Option<Duration>,
        variant: WaitVariant,
        timeout_reply: RespValue,
        mut check: F,
    ) -> PendingReply
    where
        F: FnMut(Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = Option<RespValue>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let waiter_id = self.registry.lock().await.register(client, &keys);
        // a deadline too far out to represent is no deadline at all
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

        debug!(%client, ?keys, waiter_id, "client blocked");

        let coordinator = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let woken = coordinator.wake.notified();

                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = woken => {}
                    _ = sleep_until(deadline) => {
                        coordinator.registry.lock().await.deregister(waiter_id);
                        debug!(%client, waiter_id, "blocked client timed out");
                        let _ = sender.send(timeout_reply);
                        return;
                    }
                }

                // nobody is left to take what `check` would consume
                if sender.is_closed() {
                    coordinator.registry.lock().await.deregister(waiter_id);
                    debug!(%client, waiter_id, "blocked client went away");
                    return;
                }

                let ready_keys = coordinator.ready_keys(waiter_id, &keys, variant).await;

                if ready_keys.is_empty() {
                    continue;
                }

                if let Some(reply) = check(ready_keys).await {
                    // no await between `check` and the send, so an abort
                    // cannot separate a served reply from its client
                    if sender.send(reply).is_err() {
                        debug!(%client, waiter_id, "reply dropped by a closed connection");
                    }

                    coordinator.registry.lock().await.deregister(waiter_id);
                    // the next waiter in line may now be at the head
                    coordinator.wake();
                    return;
                }
            }
        });

        if let Some(waiter) = self.registry.lock().await.waiters.get_mut(&waiter_id) {
            waiter.task = Some(task.abort_handle());
        }

        PendingReply::new(receiver)
    }

    /// Signals every waiter to re-check now instead of at its next tick.
    pub fn wake(&self) {
        self.wake.notify_waiters();
    }

    /// True when some client is already queued on one of `keys`.
    pub async fn has_waiters(&self, keys: &[String]) -> bool {
        let registry = self.registry.lock().await;
        keys.iter().any(|key| registry.queues.contains_key(key))
    }

    pub async fn queued_clients(&self, key: &str) -> Vec<ClientId> {
        let registry = self.registry.lock().await;

        registry
            .queues
            .get(key)
            .map(|queue| {
                queue
                    .iter()
                    .filter_map(|id| registry.waiters.get(id).map(|waiter| waiter.client))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drops every waiter owned by `client` without resolving it.
    pub async fn remove_client(&self, client: ClientId) -> usize {
        let mut registry = self.registry.lock().await;

        let owned = registry
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.client == client)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();

        for id in &owned {
            if let Some(task) = registry.deregister(*id).and_then(|waiter| waiter.task) {
                task.abort();
            }
        }

        drop(registry);

        if !owned.is_empty() {
            debug!(%client, count = owned.len(), "cancelled blocked waiters");
            self.wake();
        }

        owned.len()
    }

    async fn ready_keys(&self, id: WaiterId, keys: &[String], variant: WaitVariant) -> Vec<String> {
        match variant {
            WaitVariant::Stream => keys.to_vec(),
            WaitVariant::Keyed => {
                let registry = self.registry.lock().await;

                keys.iter()
                    .filter(|key| registry.is_head(id, key))
                    .cloned()
                    .collect()
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
