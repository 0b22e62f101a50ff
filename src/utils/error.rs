//! The `error` module defines the error type used throughout the broker.
//!
//! Only a few of these ever reach the process boundary: a bind failure is the
//! one fatal broker error. Everything else is logged and scoped to the
//! connection that caused it.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
