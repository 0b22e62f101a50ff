//! Topic index entry
//!
//! A `Topic` holds the ordered list of subscriber ids for one topic name.
//! Subscribing twice adds a second entry, so the client receives every
//! publish twice; unsubscribing removes one entry at a time.
//!
//! Callers must synchronize access (the broker lock) when modifying it.

use crate::client::ClientId;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: Vec<ClientId>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    /// Append a subscriber. Duplicates are kept.
    pub fn subscribe(&mut self, id: ClientId) {
        self.subscribers.push(id);
    }

    /// Remove the first entry for `id`, keeping the order of the rest.
    /// Returns whether an entry was removed.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        match self.subscribers.iter().position(|sub| sub == id) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entry for `id`.
    pub fn remove_all(&mut self, id: &str) {
        self.subscribers.retain(|sub| sub != id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subscribers.iter().any(|sub| sub == id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
