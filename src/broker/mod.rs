//! The broker core: who is connected, who listens to what, what was last
//! published, and how inbound frames turn into deliveries.
//!
//! - `state`: the connection registry and topic index, plus the store
//! - `store`: last value and bounded history per topic
//! - `engine`: the shared, lock-protected `Broker` handle
//! - `notifier`: queueing one frame for one client
//! - `router`: decoding and dispatching inbound frames

pub mod engine;
pub mod message;
pub mod notifier;
pub mod router;
pub mod state;
pub mod store;
pub mod topic;

pub use engine::Broker;
pub use message::{BROKER_ORIGIN, Frame, Message, MessageType};
pub use router::Router;
