//! Frame interpretation.
//!
//! The router is stateless between frames: it decodes one line, stamps it
//! with the sender's id and the receipt time, and dispatches on its type.

use chrono::Local;
use tracing::{debug, warn};

use crate::broker::engine::Broker;
use crate::broker::message::{Frame, MessageType};

#[derive(Debug, Clone)]
pub struct Router {
    broker: Broker,
}

impl Router {
    pub fn new(broker: Broker) -> Self {
        Self { broker }
    }

    /// Routes one line received from `client_id`.
    ///
    /// Returns the type that was acted on, or `None` if the frame was dropped.
    /// A malformed frame is logged and dropped; it never ends the connection.
    pub fn route(&self, client_id: &str, line: &[u8]) -> Option<MessageType> {
        match Frame::decode(line) {
            Ok(frame) => self.dispatch(client_id, frame),
            Err(e) => {
                warn!(
                    client_id,
                    "{e} | {}",
                    String::from_utf8_lossy(line).chars().take(100).collect::<String>()
                );
                None
            }
        }
    }

    pub fn dispatch(&self, client_id: &str, frame: Frame) -> Option<MessageType> {
        if !self.broker.is_registered(client_id) {
            debug!(client_id, "frame from unregistered client dropped");
            return None;
        }

        let message = frame.into_message(client_id, Local::now());
        match message.kind {
            MessageType::Subscribe => self.broker.subscribe(client_id, &message.topic),
            MessageType::Unsubscribe => self.broker.unsubscribe(client_id, &message.topic),
            MessageType::SensorData => self.broker.publish(&message),
            MessageType::GetCurrent => {
                let sent = self.broker.send_current(client_id);
                debug!(client_id, topics = sent, "answered get_current");
            }
            MessageType::Unknown => {
                debug!(client_id, "ignoring frame of unknown type");
                return None;
            }
        }
        Some(message.kind)
    }
}
