//! The `transport` module carries the wire protocol over TCP: newline-framed
//! JSON in both directions, one reader and one writer task per connection.

pub mod connection;
pub mod framing;
pub mod tcp;

pub use tcp::{serve, start_tcp_server};

#[cfg(test)]
mod tests;
