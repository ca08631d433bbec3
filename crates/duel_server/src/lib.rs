//! HTTP and WebSocket transport for duel sessions.
//!
//! - `GET /api/health` reports liveness and the session count
//! - `POST /api/games/create` opens a new game
//! - `POST /api/games/join` checks a game can take another player
//! - `GET /ws` carries the per-connection event stream

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod http;
pub mod server;
pub mod ws;

pub use cli::{Cli, Command, ServeArgs};
pub use config::{ConfigError, PORT_ENV, ServerConfig};
pub use http::{GameResponse, HealthResponse, JoinRequest};
pub use server::{router, run, serve};
