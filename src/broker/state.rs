//! Shared broker state: the connection registry, the topic index and the
//! state store.
//!
//! Nothing here locks or performs I/O. `Broker` wraps a `BrokerState` in one
//! lock and is the only way the rest of the crate reaches it.

use std::collections::HashMap;

use crate::broker::store::StateStore;
use crate::broker::topic::Topic;
use crate::client::{Client, ClientHandle, ClientId};

#[derive(Debug, Default)]
pub struct BrokerState {
    pub(crate) clients: HashMap<ClientId, Client>,
    pub(crate) topics: HashMap<String, Topic>,
    pub(crate) store: StateStore,
}

/// Result of a successful subscribe: where to deliver, and the value to
/// replay when the topic already has one.
#[derive(Debug)]
pub struct Subscription {
    pub client: ClientHandle,
    pub last_value: Option<f64>,
}

impl BrokerState {
    pub fn new(store: StateStore) -> Self {
        Self {
            clients: HashMap::new(),
            topics: HashMap::new(),
            store,
        }
    }

    /// Registers a client. A client with the same id is replaced.
    pub fn add_client(&mut self, client: Client) -> ClientHandle {
        let handle = client.handle();
        self.clients.insert(client.id.clone(), client);
        handle
    }

    /// Unregisters a client and drops it from every topic it held.
    ///
    /// The removed record is returned so the caller decides when it is
    /// dropped; dropping it closes the connection.
    pub fn remove_client(&mut self, client_id: &str) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        for topic in &client.subscriptions {
            if let Some(entry) = self.topics.get_mut(topic) {
                entry.remove_all(client_id);
                if entry.is_empty() {
                    self.topics.remove(topic);
                }
            }
        }
        Some(client)
    }

    /// Appends the client to the topic's subscriber list. `None` if the
    /// client is not registered.
    pub fn subscribe(&mut self, client_id: &str, topic: &str) -> Option<Subscription> {
        let client = self.clients.get_mut(client_id)?;
        client.subscriptions.insert(topic.to_string());

        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(client_id.to_string());

        Some(Subscription {
            client: client.handle(),
            last_value: self.store.last_value(topic),
        })
    }

    /// Removes one subscription entry. Returns whether anything was removed.
    ///
    /// The topic stays in the client's subscription set while duplicate
    /// entries remain, so a later removal still finds them.
    pub fn unsubscribe(&mut self, client_id: &str, topic: &str) -> bool {
        let Some(client) = self.clients.get_mut(client_id) else {
            return false;
        };
        let Some(entry) = self.topics.get_mut(topic) else {
            client.subscriptions.remove(topic);
            return false;
        };

        let removed = entry.unsubscribe(client_id);
        if !entry.contains(client_id) {
            client.subscriptions.remove(topic);
        }
        if entry.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Delivery handles for the topic's subscribers, in list order.
    pub fn subscribers_of(&self, topic: &str) -> Vec<ClientHandle> {
        self.topics
            .get(topic)
            .map(|entry| {
                entry
                    .subscribers
                    .iter()
                    .filter_map(|id| self.clients.get(id))
                    .map(Client::handle)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn mark_publisher(&mut self, client_id: &str) {
        if let Some(client) = self.clients.get_mut(client_id) {
            client.is_publisher = true;
        }
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.get(client_id)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }
}
