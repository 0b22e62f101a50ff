use std::collections::HashSet;

use tokio::sync::{mpsc::UnboundedSender, oneshot};

pub type ClientId = String;

/// Sending side of a client's outbound queue. Each item is one encoded frame.
pub type OutboundSender = UnboundedSender<String>;

/// Held by the registry; dropping it tells the connection's reader to stop.
pub type ShutdownSignal = oneshot::Sender<()>;

/// Represents a connected client in the registry.
///
/// The registry owns this record exclusively. Dropping it releases the only
/// long-lived queue sender and the shutdown signal, which lets the writer and
/// reader tasks finish and close both halves of the socket.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub sender: OutboundSender,
    /// Topics the client is subscribed to.
    pub subscriptions: HashSet<String>,
    /// Set once the client has published at least one `sensor_data` frame.
    pub is_publisher: bool,
    _shutdown: Option<ShutdownSignal>,
}

impl Client {
    pub fn new(id: impl Into<ClientId>, sender: OutboundSender) -> Self {
        Self {
            id: id.into(),
            sender,
            subscriptions: HashSet::new(),
            is_publisher: false,
            _shutdown: None,
        }
    }

    /// Attaches the signal that stops the connection's reader on removal.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self._shutdown = Some(shutdown);
        self
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            id: self.id.clone(),
            sender: self.sender.clone(),
        }
    }
}

/// The delivery half of a client: enough to push a frame and to name the
/// client when that fails.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ClientId,
    pub sender: OutboundSender,
}
