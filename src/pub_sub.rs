//! Channel registry for publish/subscribe.

use std::collections::{BTreeMap, HashMap};

use crate::{
    resp::RespValue,
    session::{ClientId, Outbox},
};

#[derive(Debug, Default)]
pub struct PubSub {
    channels: HashMap<String, BTreeMap<ClientId, Outbox>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, channel: &str, client: ClientId, outbox: Outbox) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(client, outbox);
    }

    pub fn unsubscribe(&mut self, channel: &str, client: ClientId) {
        if let Some(subscribers) = self.channels.get_mut(channel) {
            subscribers.remove(&client);

            if subscribers.is_empty() {
                self.channels.remove(channel);
            }
        }
    }

    pub fn remove_client(&mut self, client: ClientId) {
        self.channels.retain(|_, subscribers| {
            subscribers.remove(&client);
            !subscribers.is_empty()
        });
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, BTreeMap::len)
    }

    /// Pushes `["message", channel, message]` to every subscriber and returns
    /// how many received it.
    pub fn publish(&mut self, channel: &str, message: &str) -> usize {
        let Some(subscribers) = self.channels.get(channel) else {
            return 0;
        };

        let push = RespValue::bulk_string_array(["message", channel, message]).to_bytes();

        subscribers
            .values()
            .filter(|outbox| outbox.send(push.clone()).is_ok())
            .count()
    }
}
