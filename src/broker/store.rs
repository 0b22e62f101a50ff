//! Per-topic state: the last value seen and a bounded history of recent
//! `sensor_data` messages.

use std::collections::{HashMap, VecDeque};

use crate::broker::message::Message;

/// Default number of messages retained per topic.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct StateStore {
    last_values: HashMap<String, f64>,
    history: HashMap<String, VecDeque<Message>>,
    capacity: usize,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl StateStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            last_values: HashMap::new(),
            history: HashMap::new(),
            capacity,
        }
    }

    /// Overwrites the topic's last value and appends the message to its
    /// history, evicting the oldest entries beyond capacity.
    pub fn record_and_trim(&mut self, message: &Message) {
        self.last_values
            .insert(message.topic.clone(), message.data);

        let ring = self.history.entry(message.topic.clone()).or_default();
        ring.push_back(message.clone());
        while ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    pub fn last_value(&self, topic: &str) -> Option<f64> {
        self.last_values.get(topic).copied()
    }

    /// Copy of every topic's last value.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.last_values.clone()
    }

    /// Copy of the topic's history, oldest first. Empty for unknown topics.
    pub fn history(&self, topic: &str) -> Vec<Message> {
        self.history
            .get(topic)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }
}
