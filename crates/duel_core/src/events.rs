//! Events exchanged with connected clients.
//!
//! Both directions use an adjacently tagged JSON shape:
//! `{"event": "<name>", "data": {...}}`.

use crate::error::SessionErrorKind;
use crate::session::{Player, PlayerId, SessionId};
use duel_board::{Board, Symbol};
use serde::{Deserialize, Serialize};

/// Machine-readable error code sent to clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown session id.
    NotFound,
    /// Session already has two players.
    Full,
    /// Connection is already playing a live game.
    AlreadyJoined,
    /// Frame could not be decoded.
    Malformed,
    /// Unexpected server-side fault.
    Internal,
}

impl From<SessionErrorKind> for ErrorCode {
    fn from(kind: SessionErrorKind) -> Self {
        match kind {
            SessionErrorKind::NotFound => ErrorCode::NotFound,
            SessionErrorKind::Full => ErrorCode::Full,
            SessionErrorKind::AlreadyJoined => ErrorCode::AlreadyJoined,
            SessionErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

/// Event sent from the server to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent to the joining connection after every successful join.
    Assigned {
        /// Symbol the connection plays.
        symbol: Symbol,
    },

    /// Sent to both players once the second one joins.
    GameStart {
        /// The (empty) board.
        board: Board,
        /// Both players, X first.
        players: Vec<Player>,
        /// Player who moves first.
        current_player: PlayerId,
    },

    /// Sent to both players after every accepted move.
    GameUpdate {
        /// Board after the move.
        board: Board,
        /// Player to move next, or the last mover once the game is over.
        current_player: Option<PlayerId>,
        /// True when the move ended the game.
        is_over: bool,
        /// Winner's display name; `None` for a draw or an ongoing game.
        winner: Option<String>,
    },

    /// Sent to the remaining player when the opponent disconnects.
    PlayerDisconnected {
        /// Human-readable notice.
        message: String,
        /// Display name of the remaining player.
        winner: String,
    },

    /// Sent to the offending connection only.
    Error {
        /// Error category.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Builds an error event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Assigned { .. } => "assigned",
            ServerEvent::GameStart { .. } => "gameStart",
            ServerEvent::GameUpdate { .. } => "gameUpdate",
            ServerEvent::PlayerDisconnected { .. } => "playerDisconnected",
            ServerEvent::Error { .. } => "error",
        }
    }
}

/// Event sent from a connection to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Take a seat in a session.
    JoinGame {
        /// Session to join.
        game_id: SessionId,
        /// Display name shown to the opponent.
        player_name: String,
    },

    /// Place a mark.
    ///
    /// Coordinates are signed so that negative values from a client
    /// decode and are then dropped like any other out-of-bounds move.
    MakeMove {
        /// Target session.
        game_id: SessionId,
        /// Target row.
        row: i64,
        /// Target column.
        col: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_join_shape() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "joinGame",
            "data": {"gameId": "ABC123", "playerName": "Alice"}
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinGame {
                game_id: "ABC123".to_string(),
                player_name: "Alice".to_string(),
            }
        );
    }

    #[test]
    fn test_client_move_accepts_negative_coordinates() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "makeMove",
            "data": {"gameId": "ABC123", "row": -1, "col": 2}
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::MakeMove {
                game_id: "ABC123".to_string(),
                row: -1,
                col: 2,
            }
        );
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event": "chat", "data": {"text": "hi"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_game_update_shape() {
        let event = ServerEvent::GameUpdate {
            board: Board::new(),
            current_player: Some("c2".to_string()),
            is_over: false,
            winner: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "gameUpdate");
        assert_eq!(value["data"]["currentPlayer"], "c2");
        assert_eq!(value["data"]["isOver"], false);
        assert!(value["data"]["winner"].is_null());
        assert_eq!(value["data"]["board"][2], json!(["", "", ""]));
    }

    #[test]
    fn test_error_shape() {
        let event = ServerEvent::error(ErrorCode::from(SessionErrorKind::Full), "Game is full");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "error", "data": {"code": "FULL", "message": "Game is full"}})
        );
        assert_eq!(ErrorCode::AlreadyJoined.to_string(), "ALREADY_JOINED");
    }
}
