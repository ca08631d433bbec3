//! Session core for two-player duels on a 3x3 board.
//!
//! # Architecture
//!
//! - **Registry**: process-wide store of sessions, one lock per session
//! - **Engine**: admission and move rules applied to a locked session
//! - **Bindings**: which connection plays in which session
//! - **Broadcaster**: fire-and-forget delivery of events to connections
//! - **Reaper**: background eviction of idle sessions
//!
//! [`Coordinator`] ties these together and is the only entry point a
//! transport needs.
//!
//! # Example
//!
//! ```
//! use duel_core::{CoreConfig, Coordinator, MoveOutcome};
//!
//! let coordinator = Coordinator::new(CoreConfig::default());
//! let game = coordinator.create_session();
//!
//! let mut alice = coordinator.connect();
//! let mut bob = coordinator.connect();
//! coordinator.join(alice.id(), &game, "Alice").unwrap();
//! coordinator.join(bob.id(), &game, "Bob").unwrap();
//!
//! let outcome = coordinator.make_move(alice.id(), &game, 0, 0).unwrap();
//! assert!(matches!(outcome, MoveOutcome::Continued { .. }));
//! # let _ = (alice.try_recv(), bob.try_recv());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod broadcast;
mod config;
mod coordinator;
mod engine;
mod error;
mod events;
mod reaper;
mod registry;
mod session;

pub use binding::ConnectionBindings;
pub use broadcast::{Broadcaster, EventReceiver, EventSender};
pub use config::CoreConfig;
pub use coordinator::{Connection, Coordinator};
pub use engine::{IgnoreReason, MoveOutcome};
pub use error::{SessionError, SessionErrorKind};
pub use events::{ClientEvent, ErrorCode, ServerEvent};
pub use reaper::IdleReaper;
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{ConnectionId, Placement, Player, PlayerId, Session, SessionId, SessionStatus};

pub use duel_board::{Board, Cell, Symbol};
