//! Delivery of outbound frames to a single client.

use tokio::runtime::Handle;
use tracing::warn;

use crate::broker::engine::Broker;
use crate::broker::message::Message;
use crate::client::{ClientHandle, ClientId};

impl Broker {
    /// Serializes `message` and queues it for the client. Returns whether the
    /// frame was queued; on failure the client is scheduled for removal.
    pub fn notify(&self, client: &ClientHandle, message: &Message) -> bool {
        match message.encode_line() {
            Ok(line) => self.deliver(client, &line),
            Err(e) => {
                warn!(client_id = %client.id, "failed to encode notification: {e}");
                false
            }
        }
    }

    /// Queues an already encoded frame.
    pub(crate) fn deliver(&self, client: &ClientHandle, line: &str) -> bool {
        if client.sender.send(line.to_owned()).is_ok() {
            return true;
        }

        warn!(client_id = %client.id, "delivery failed, connection is gone");
        self.schedule_removal(client.id.clone());
        false
    }

    /// Runs `remove_client` on another task. The caller may hold the broker
    /// lock, so removal must not happen on this call stack.
    pub(crate) fn schedule_removal(&self, client_id: ClientId) {
        let broker = self.clone();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { broker.remove_client(&client_id) });
            }
            Err(_) => {
                std::thread::spawn(move || broker.remove_client(&client_id));
            }
        }
    }
}
