//! Message definitions for the broker
//!
//! `Message` is both the inbound request and the outbound notification. Every
//! frame on the wire is one JSON object terminated by `\n`:
//!
//! ```json
//! {"type":"sensor_data","topic":"humidity","data":55.0,"timestamp":"2024-05-01T12:00:00.000000+02:00","client_id":"client_1714557600000000000"}
//! ```
//!
//! `timestamp` and `client_id` are only meaningful on output: the router
//! overwrites them on every inbound frame, so a client can never choose them.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::utils::{BrokerError, Result};

/// Origin id used for notifications the broker synthesizes itself.
pub const BROKER_ORIGIN: &str = "broker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SensorData,
    Subscribe,
    Unsubscribe,
    GetCurrent,
    /// Any `type` the broker does not understand. Such frames are ignored.
    #[default]
    #[serde(other, skip_serializing)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub topic: String,
    pub data: f64,
    pub timestamp: DateTime<Local>,
    pub client_id: String,
}

/// A request frame: what a client sends, and what the broker decodes before
/// stamping it.
///
/// Missing fields decode as empty/zero; `timestamp` and `client_id` are
/// accepted in any shape and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub data: f64,
}

impl Frame {
    pub fn new(kind: MessageType, topic: impl Into<String>, data: f64) -> Self {
        Self {
            kind,
            topic: topic.into(),
            data,
        }
    }

    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::new(MessageType::Subscribe, topic, 0.0)
    }

    pub fn sensor_data(topic: impl Into<String>, data: f64) -> Self {
        Self::new(MessageType::SensorData, topic, data)
    }

    pub fn get_current() -> Self {
        Self::new(MessageType::GetCurrent, "", 0.0)
    }

    /// Serializes the frame as one line, terminator included.
    pub fn encode_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(BrokerError::Encode)?;
        line.push('\n');
        Ok(line)
    }

    /// Decodes one line (without its terminator).
    pub fn decode(line: &[u8]) -> Result<Self> {
        serde_json::from_slice(line).map_err(BrokerError::Decode)
    }

    /// Stamps the frame with the broker-assigned origin and receipt time.
    pub fn into_message(self, client_id: &str, received_at: DateTime<Local>) -> Message {
        Message {
            kind: self.kind,
            topic: self.topic,
            data: self.data,
            timestamp: received_at,
            client_id: client_id.to_string(),
        }
    }
}

impl Message {
    /// A `sensor_data` notification originated by the broker itself, used for
    /// late-join replay and `get_current` answers.
    pub fn from_broker(topic: &str, data: f64) -> Self {
        Self {
            kind: MessageType::SensorData,
            topic: topic.to_string(),
            data,
            timestamp: Local::now(),
            client_id: BROKER_ORIGIN.to_string(),
        }
    }

    /// Serializes the message as one wire frame, line terminator included.
    pub fn encode_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(BrokerError::Encode)?;
        line.push('\n');
        Ok(line)
    }
}
