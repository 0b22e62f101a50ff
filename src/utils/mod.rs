//! The `utils` module provides the pieces shared by every other module of the
//! broker: the crate error type and the logging bootstrap.

pub mod error;
pub mod logging;

pub use error::{BrokerError, Result};
