//! Broker configuration.
//!
//! Values come from built-in defaults, overridden by `TELEMETRY_*` environment
//! variables (`TELEMETRY_SERVER__LISTEN_ADDR`, `TELEMETRY_BROKER__HISTORY_CAPACITY`,
//! ...), overridden in turn by the command line. There is no configuration file.

mod settings;

use config::{Config, Environment};

use settings::PartialSettings;

use crate::utils::Result;

pub use settings::{
    BrokerSettings, LoggingSettings, MAX_FRAME_BYTES_LIMIT, ServerSettings, Settings,
};

/// Prefix shared by every environment variable the broker reads.
pub const ENV_PREFIX: &str = "TELEMETRY";

/// Loads settings from the environment, merges them over the defaults and
/// validates the result.
pub fn load_config() -> Result<Settings> {
    let config = Config::builder()
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let partial: PartialSettings = config.try_deserialize()?;
    let settings = Settings::merge(partial);
    settings.validate()?;
    Ok(settings)
}

/// Loads settings and applies the `--listen` override when one was given.
pub fn load_config_with_listen(listen: Option<String>) -> Result<Settings> {
    let mut settings = load_config()?;
    if let Some(addr) = listen {
        settings.server.listen_addr = addr;
    }
    Ok(settings)
}
