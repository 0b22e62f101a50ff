//! Broker engine
//!
//! `Broker` is a cloneable handle to the shared state behind a single
//! reader/writer lock. Every connection task gets its own clone.
//!
//! Concurrency notes:
//! - Mutations take the lock exclusively; `snapshot` and `history` share it.
//! - Fan-out is decided under the lock, so deliveries for one topic keep the
//!   order in which publishes were recorded. Delivery itself only enqueues
//!   onto the client's outbound queue; socket writes happen in the
//!   connection's writer task, never under the lock.
//! - A failed delivery schedules `remove_client` as a separate task instead
//!   of calling it, since the lock is still held at that point.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::broker::message::Message;
use crate::broker::state::BrokerState;
use crate::broker::store::StateStore;
use crate::client::{Client, ClientHandle, ClientId};
use crate::config::BrokerSettings;

#[derive(Debug, Clone, Default)]
pub struct Broker {
    state: Arc<RwLock<BrokerState>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(BrokerState::new(StateStore::with_capacity(
                capacity,
            )))),
        }
    }

    pub fn from_settings(settings: &BrokerSettings) -> Self {
        Self::with_history_capacity(settings.history_capacity)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BrokerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, BrokerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a client. Must happen before any of its frames are routed.
    pub fn add_client(&self, client: Client) -> ClientHandle {
        let id = client.id.clone();
        let handle = self.write().add_client(client);
        info!(client_id = %id, "client connected");
        handle
    }

    /// Removes a client, its subscriptions and its connection. Unknown ids are
    /// ignored, so this is safe to call from every path that notices a dead
    /// connection.
    pub fn remove_client(&self, client_id: &str) {
        let removed = self.write().remove_client(client_id);
        if let Some(client) = removed {
            info!(client_id = %client.id, "client disconnected");
        }
    }

    /// Subscribes the client and replays the topic's last value to it, if any.
    pub fn subscribe(&self, client_id: &str, topic: &str) {
        let mut state = self.write();
        let Some(subscription) = state.subscribe(client_id, topic) else {
            debug!(client_id, topic, "subscribe from unknown client ignored");
            return;
        };
        info!(client_id, topic, "client subscribed");

        if let Some(value) = subscription.last_value {
            self.notify(&subscription.client, &Message::from_broker(topic, value));
        }
    }

    pub fn unsubscribe(&self, client_id: &str, topic: &str) {
        if self.write().unsubscribe(client_id, topic) {
            info!(client_id, topic, "client unsubscribed");
        }
    }

    /// Records a `sensor_data` message and delivers it to every current
    /// subscriber of its topic, in subscription order.
    pub fn publish(&self, message: &Message) {
        let line = match message.encode_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(topic = %message.topic, "dropping publish: {e}");
                return;
            }
        };

        let mut state = self.write();
        state.mark_publisher(&message.client_id);
        state.store_mut().record_and_trim(message);

        let subscribers = state.subscribers_of(&message.topic);
        debug!(
            client_id = %message.client_id,
            topic = %message.topic,
            data = message.data,
            subscribers = subscribers.len(),
            "publishing"
        );
        for subscriber in &subscribers {
            self.deliver(subscriber, &line);
        }
    }

    /// Sends the requesting client one `sensor_data` notification per topic
    /// with a recorded value. Returns how many were sent.
    pub fn send_current(&self, client_id: &str) -> usize {
        let state = self.read();
        let Some(client) = state.client(client_id).map(Client::handle) else {
            return 0;
        };

        let snapshot = state.store().snapshot();
        for (topic, value) in &snapshot {
            self.notify(&client, &Message::from_broker(topic, *value));
        }
        snapshot.len()
    }

    /// Copy of every topic's last value.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.read().store().snapshot()
    }

    /// Copy of a topic's recent messages, oldest first.
    pub fn history(&self, topic: &str) -> Vec<Message> {
        self.read().store().history(topic)
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.read().client(client_id).is_some()
    }

    pub fn client_count(&self) -> usize {
        self.read().clients.len()
    }

    /// Subscriber ids of a topic in delivery order, duplicates included.
    pub fn subscribers(&self, topic: &str) -> Vec<ClientId> {
        self.read()
            .topics
            .get(topic)
            .map(|entry| entry.subscribers.clone())
            .unwrap_or_default()
    }

    /// Whether the client has published; `None` for unknown clients.
    pub fn is_publisher(&self, client_id: &str) -> Option<bool> {
        self.read().client(client_id).map(|c| c.is_publisher)
    }
}
