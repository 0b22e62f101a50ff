//! The `client` module defines the broker's view of a connected client.
//!
//! A `Client` is owned by the connection registry and holds everything whose
//! lifetime is the connection's: the outbound queue and the shutdown signal.
//! A `ClientHandle` is the cheap, cloneable part used to deliver frames.

pub mod id;
pub mod pubsub_client;

pub use id::ClientIdGenerator;
pub use pubsub_client::{Client, ClientHandle, ClientId, OutboundSender, ShutdownSignal};
