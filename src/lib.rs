//! # Telemetry Broker
//!
//! `telemetry_broker` is a small publish/subscribe broker for sensor readings.
//! Clients speak newline-delimited JSON over TCP: publishers send
//! `sensor_data` frames tagged with a topic, subscribers receive every reading
//! on the topics they subscribed to, and the broker keeps the last value and a
//! bounded history per topic. State lives for the lifetime of the process.
//!
//! ## Core Modules
//!
//! - `broker`: registry, topic index, state store, routing and delivery.
//! - `client`: the broker's record of a connected client.
//! - `config`: settings from defaults, environment and command line.
//! - `transport`: the TCP listener and per-connection tasks.
//! - `collaborators`: sensor simulator, irrigation controller and dashboard
//!   probe, all of which use the broker only through its wire protocol.
//! - `utils`: error type and logging.

pub mod broker;
pub mod client;
pub mod collaborators;
pub mod config;
pub mod transport;
pub mod utils;
