//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use duel_core::CoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable that overrides the listen port.
pub const PORT_ENV: &str = "PORT";

/// Settings for the `serve` command.
///
/// Every field is optional in the TOML file; missing ones take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Address to bind to.
    #[setters(into)]
    host: String,

    /// Port to bind to.
    port: u16,

    /// Seconds between idle sweeps.
    reap_interval_secs: u64,

    /// Seconds without activity before a session is evicted.
    idle_threshold_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = CoreConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            reap_interval_secs: core.reap_interval().as_secs(),
            idle_threshold_secs: core.idle_threshold().as_secs(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies a port taken from the environment, if one was set.
    #[instrument(skip(self))]
    pub fn with_port_override(self, value: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = value else {
            return Ok(self);
        };
        let port = raw.trim().parse::<u16>().map_err(|e| {
            ConfigError::new(format!("Invalid {} value {:?}: {}", PORT_ENV, raw, e))
        })?;
        debug!(port, "Port taken from environment");
        Ok(self.with_port(port))
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reap_interval_secs == 0 {
            return Err(ConfigError::new(
                "reap_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.idle_threshold_secs == 0 {
            return Err(ConfigError::new(
                "idle_threshold_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Timing settings for the session core.
    pub fn core_config(&self) -> CoreConfig {
        CoreConfig::default()
            .with_reap_interval(Duration::from_secs(self.reap_interval_secs))
            .with_idle_threshold(Duration::from_secs(self.idle_threshold_secs))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
