//! Command-line interface for duel_server.

use crate::config::{ConfigError, ServerConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::instrument;

/// Duel Server - Real-time two-player 3x3 games over WebSocket
#[derive(Parser, Debug)]
#[command(name = "duel_server")]
#[command(about = "Session server for two-player 3x3 duels", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and WebSocket server
    Serve(ServeArgs),
}

/// Options for `serve`. Flags win over the `PORT` variable, which wins
/// over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between idle sweeps
    #[arg(long)]
    pub reap_interval_secs: Option<u64>,

    /// Seconds without activity before a game is evicted
    #[arg(long)]
    pub idle_threshold_secs: Option<u64>,
}

impl ServeArgs {
    /// Builds the effective configuration.
    ///
    /// `port_env` is the raw value of the `PORT` variable, if set.
    #[instrument(skip(self))]
    pub fn resolve(&self, port_env: Option<&str>) -> Result<ServerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        let mut config = base.with_port_override(port_env)?;
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(secs) = self.reap_interval_secs {
            config = config.with_reap_interval_secs(secs);
        }
        if let Some(secs) = self.idle_threshold_secs {
            config = config.with_idle_threshold_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}
