use config::ConfigError;
use serde::Deserialize;

/// Largest accepted `broker.max_frame_bytes`.
pub const MAX_FRAME_BYTES_LIMIT: usize = 16 * 1024 * 1024;

/// Top-level configuration settings for the broker.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Where the listener binds.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub listen_addr: String,
}

/// Limits applied to topic state and inbound frames.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    /// Number of messages retained per topic, oldest evicted first.
    pub history_capacity: usize,
    /// Longest accepted frame in bytes, excluding the line terminator.
    pub max_frame_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from the environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub listen_addr: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub history_capacity: Option<usize>,
    pub max_frame_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            broker: BrokerSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl Settings {
    /// Fills every value missing from `partial` with the default.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();

        Settings {
            server: ServerSettings {
                listen_addr: partial
                    .server
                    .and_then(|s| s.listen_addr)
                    .unwrap_or(default.server.listen_addr),
            },
            broker: BrokerSettings {
                history_capacity: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.history_capacity)
                    .unwrap_or(default.broker.history_capacity),
                max_frame_bytes: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.max_frame_bytes)
                    .unwrap_or(default.broker.max_frame_bytes),
            },
            logging: LoggingSettings {
                level: partial
                    .logging
                    .and_then(|l| l.level)
                    .unwrap_or(default.logging.level),
            },
        }
    }

    /// Rejects limits the broker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.history_capacity == 0 {
            return Err(ConfigError::Message(
                "broker.history_capacity must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_FRAME_BYTES_LIMIT).contains(&self.broker.max_frame_bytes) {
            return Err(ConfigError::Message(format!(
                "broker.max_frame_bytes must be between 1 and {MAX_FRAME_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}
