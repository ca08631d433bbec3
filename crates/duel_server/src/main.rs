//! Duel Server - session server for two-player 3x3 duels.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use duel_server::{Cli, Command, PORT_ENV, ServeArgs};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
    }
}

/// Run the HTTP and WebSocket server
async fn run_serve(args: ServeArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,duel_core=debug")),
        )
        .init();

    let port_env = std::env::var(PORT_ENV).ok();
    let config = args.resolve(port_env.as_deref())?;

    info!(?config, "Starting duel server");
    duel_server::serve(config).await
}
