//! Session record: the full state of one duel.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use duel_board::{Board, Symbol};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Opaque identifier for a live transport connection.
pub type ConnectionId = String;

/// Players are identified by the connection they joined on.
pub type PlayerId = ConnectionId;

/// A player admitted to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Player {
    /// Connection the player joined on.
    #[serde(rename = "id")]
    connection_id: ConnectionId,
    /// Name chosen by the client.
    #[serde(rename = "name")]
    display_name: String,
    /// Mark assigned at admission, never changes.
    symbol: Symbol,
}

/// One accepted move, kept in order of application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Placement {
    /// Symbol that was written.
    symbol: Symbol,
    /// Target row.
    row: usize,
    /// Target column.
    col: usize,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Fewer than two players admitted.
    Waiting,
    /// Two players admitted, no terminal condition yet.
    InProgress,
    /// The given player completed a line.
    Won(PlayerId),
    /// The board filled up without a line.
    Drawn,
    /// A player disconnected before the game ended.
    Abandoned,
}

impl SessionStatus {
    /// Returns true for Won, Drawn and Abandoned.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Won(_) | SessionStatus::Drawn | SessionStatus::Abandoned
        )
    }
}

/// A game session between up to two players.
///
/// Fields are only mutated by the engine while the session lock is
/// held; everything outside the crate sees read-only getters.
#[derive(Debug, Clone, Getters)]
pub struct Session {
    /// Session ID.
    pub(crate) id: SessionId,
    /// The board.
    pub(crate) board: Board,
    /// Admitted players, X first.
    pub(crate) players: Vec<Player>,
    /// Player allowed to move, set once both players are in.
    pub(crate) current_player: Option<PlayerId>,
    /// Lifecycle status.
    pub(crate) status: SessionStatus,
    /// Accepted moves in order.
    pub(crate) history: Vec<Placement>,
    /// Wall-clock creation time.
    pub(crate) created_at: DateTime<Utc>,
    /// Last join, precheck or accepted move.
    pub(crate) last_activity: Instant,
    /// Set once the session has been detached from the registry.
    #[getter(skip)]
    pub(crate) retired: bool,
}

impl Session {
    /// Creates a new waiting session with an empty board.
    #[instrument]
    pub fn new(id: SessionId) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            board: Board::new(),
            players: Vec::with_capacity(2),
            current_player: None,
            status: SessionStatus::Waiting,
            history: Vec::new(),
            created_at: Utc::now(),
            last_activity: Instant::now(),
            retired: false,
        }
    }

    /// Gets the player joined on the given connection.
    pub fn player(&self, connection_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    /// Gets the other player of the session, if present.
    pub fn opponent_of(&self, connection_id: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection_id != connection_id)
    }

    /// Connections of every admitted player.
    pub fn player_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.players.iter().map(|p| p.connection_id.as_str())
    }

    /// Returns true once the registry no longer holds this session.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Time elapsed since the last activity, measured at `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
