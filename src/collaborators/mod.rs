//! Programs that talk to the broker only through its wire protocol.
//!
//! - `link`: dialing with retry and frame I/O shared by all of them
//! - `sensor`: a simulated sensor publishing readings on one topic
//! - `irrigation`: a controller reacting to humidity and temperature
//! - `probe`: a one-shot `get_current` query, as a dashboard would issue

pub mod irrigation;
pub mod link;
pub mod probe;
pub mod sensor;

#[cfg(test)]
mod tests;
