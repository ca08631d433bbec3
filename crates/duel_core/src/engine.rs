//! Turn engine: admission and move rules over a locked session.
//!
//! Functions here only transform a [`Session`]; they never touch the
//! registry or emit events. The caller holds the session lock for the
//! whole call, which makes every transition atomic.

use crate::error::{SessionError, SessionErrorKind};
use crate::session::{Placement, Player, PlayerId, Session, SessionStatus};
use duel_board::{PlaceError, Symbol, check_draw, check_win};
use tracing::{debug, info, instrument, warn};

/// Why a move was dropped without any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IgnoreReason {
    /// No live session with that id.
    #[display("session not found")]
    SessionNotFound,
    /// The session is waiting for players or already over.
    #[display("session not in progress")]
    NotInProgress,
    /// The submitting connection is not the current player.
    #[display("not the player's turn")]
    NotYourTurn,
    /// Row or column outside the board.
    #[display("cell out of bounds")]
    OutOfBounds,
    /// The target cell already has a mark.
    #[display("cell occupied")]
    Occupied,
}

/// Result of submitting a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Move accepted, the turn passed to `next`.
    Continued {
        /// Player who moves next.
        next: PlayerId,
    },
    /// Move accepted and completed a line.
    Won {
        /// The acting player.
        winner: Player,
    },
    /// Move accepted and filled the board.
    Drawn,
    /// Move dropped. Stale or racing clients hit this routinely.
    Ignored(IgnoreReason),
}

impl MoveOutcome {
    /// Returns true if the move changed the board.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MoveOutcome::Ignored(_))
    }
}

/// Admits a player, assigning X to the first and O to the second.
///
/// The second admission starts the game in the same step.
#[instrument(skip(session), fields(session_id = %session.id))]
pub(crate) fn admit(
    session: &mut Session,
    connection_id: &str,
    display_name: &str,
) -> Result<Symbol, SessionError> {
    if session.retired || session.status == SessionStatus::Abandoned {
        warn!(connection_id, "Join on a session that is gone");
        return Err(SessionError::new(SessionErrorKind::NotFound));
    }

    if session.player(connection_id).is_some() {
        warn!(connection_id, "Connection already joined this session");
        return Err(SessionError::new(SessionErrorKind::AlreadyJoined));
    }

    let symbol = match session.players.len() {
        0 => Symbol::X,
        1 => Symbol::O,
        _ => {
            warn!(connection_id, "Session already has 2 players");
            return Err(SessionError::new(SessionErrorKind::Full));
        }
    };

    info!(connection_id, display_name, %symbol, "Admitting player");
    session.players.push(Player::new(
        connection_id.to_string(),
        display_name.to_string(),
        symbol,
    ));

    if session.players.len() == 2 {
        let first = session.players[0].connection_id().clone();
        info!(first_player = %first, "Both players present, starting game");
        session.current_player = Some(first);
        session.status = SessionStatus::InProgress;
    }

    session.touch();
    Ok(symbol)
}

/// Applies a move for `connection_id` at `(row, col)`.
///
/// Illegal moves leave the session untouched and come back as
/// [`MoveOutcome::Ignored`].
#[instrument(skip(session), fields(session_id = %session.id))]
pub(crate) fn apply_move(
    session: &mut Session,
    connection_id: &str,
    row: usize,
    col: usize,
) -> MoveOutcome {
    if session.retired {
        return ignored(IgnoreReason::SessionNotFound);
    }

    if session.status != SessionStatus::InProgress {
        return ignored(IgnoreReason::NotInProgress);
    }

    if session.current_player.as_deref() != Some(connection_id) {
        return ignored(IgnoreReason::NotYourTurn);
    }

    let Some(player) = session.player(connection_id).cloned() else {
        return ignored(IgnoreReason::NotYourTurn);
    };
    let Some(next) = session
        .opponent_of(connection_id)
        .map(|p| p.connection_id().clone())
    else {
        return ignored(IgnoreReason::NotInProgress);
    };

    if let Err(e) = session.board.place(row, col, *player.symbol()) {
        return ignored(match e {
            PlaceError::OutOfBounds { .. } => IgnoreReason::OutOfBounds,
            PlaceError::Occupied { .. } => IgnoreReason::Occupied,
        });
    }

    session
        .history
        .push(Placement::new(*player.symbol(), row, col));
    session.touch();

    debug!(board = %session.board, "Board after move");

    if check_win(&session.board, *player.symbol()) {
        info!(winner = %player.display_name(), "Game won");
        session.status = SessionStatus::Won(connection_id.to_string());
        MoveOutcome::Won { winner: player }
    } else if check_draw(&session.board) {
        info!("Game drawn");
        session.status = SessionStatus::Drawn;
        MoveOutcome::Drawn
    } else {
        session.current_player = Some(next.clone());
        MoveOutcome::Continued { next }
    }
}

/// Marks the session abandoned by `connection_id`.
///
/// Returns the remaining player, who is the de facto winner.
#[instrument(skip(session), fields(session_id = %session.id))]
pub(crate) fn abandon(session: &mut Session, connection_id: &str) -> Option<Player> {
    info!(connection_id, previous = ?session.status, "Abandoning session");
    session.status = SessionStatus::Abandoned;
    session.current_player = None;
    session.opponent_of(connection_id).cloned()
}

fn ignored(reason: IgnoreReason) -> MoveOutcome {
    debug!(%reason, "Ignoring move");
    MoveOutcome::Ignored(reason)
}
