//! Router assembly and the serve loop.

use crate::config::ServerConfig;
use crate::{http, ws};
use axum::Router;
use axum::routing::{get, post};
use duel_core::{Coordinator, IdleReaper};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// Builds the application router over a shared coordinator.
pub fn router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/api/health", get(http::health))
        .route("/api/games/create", post(http::create_game))
        .route("/api/games/join", post(http::join_game))
        .route("/ws", get(ws::ws_upgrade))
        .with_state(coordinator)
}

/// Binds to the configured address and serves until Ctrl-C.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host().as_str(), *config.port())).await?;
    let coordinator = Coordinator::new(config.core_config());
    run(listener, coordinator, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// The idle reaper runs for as long as the server does.
pub async fn run(
    listener: TcpListener,
    coordinator: Coordinator,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let reaper = IdleReaper::spawn(coordinator.clone());

    info!(%addr, "Server listening");
    info!("Test the server at: http://{}/api/health", addr);

    let result = axum::serve(listener, router(coordinator))
        .with_graceful_shutdown(shutdown)
        .await;

    reaper.shutdown().await;
    info!("Server stopped");
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
