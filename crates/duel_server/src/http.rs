//! REST endpoints: health, create, join precheck.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use duel_core::{Coordinator, SessionError, SessionErrorKind, SessionId};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// Time the check ran.
    pub timestamp: DateTime<Utc>,
    /// Number of live sessions.
    pub sessions: usize,
}

/// Body of `POST /api/games/join`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Session to check.
    #[serde(default)]
    pub game_id: Option<SessionId>,
}

/// Body returned by the create and join endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// Session id, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<SessionId>,
    /// Failure reason, on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GameResponse {
    fn ok(game_id: SessionId) -> Self {
        Self {
            success: true,
            game_id: Some(game_id),
            error: None,
        }
    }

    fn failed(err: &SessionError) -> (StatusCode, Json<Self>) {
        let status = match err.kind() {
            SessionErrorKind::NotFound => StatusCode::NOT_FOUND,
            SessionErrorKind::Full => StatusCode::BAD_REQUEST,
            SessionErrorKind::AlreadyJoined => StatusCode::CONFLICT,
            SessionErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Self {
            success: false,
            game_id: None,
            error: Some(err.kind().to_string()),
        };
        (status, Json(body))
    }
}

/// `GET /api/health`
#[instrument(skip_all)]
pub async fn health(State(coordinator): State<Coordinator>) -> Json<HealthResponse> {
    info!("Health check endpoint called");
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        sessions: coordinator.registry().len(),
    })
}

/// `POST /api/games/create`
#[instrument(skip_all)]
pub async fn create_game(State(coordinator): State<Coordinator>) -> Json<GameResponse> {
    let game_id = coordinator.create_session();
    info!(game_id = %game_id, "Game created");
    Json(GameResponse::ok(game_id))
}

/// `POST /api/games/join`
///
/// Only checks that the game can take another player; the seat itself is
/// taken over the WebSocket.
#[instrument(skip_all)]
pub async fn join_game(
    State(coordinator): State<Coordinator>,
    Json(request): Json<JoinRequest>,
) -> (StatusCode, Json<GameResponse>) {
    let Some(game_id) = request.game_id else {
        warn!("Join request without game id");
        return GameResponse::failed(&SessionError::new(SessionErrorKind::NotFound));
    };

    match coordinator.join_precheck(&game_id) {
        Ok(()) => (StatusCode::OK, Json(GameResponse::ok(game_id))),
        Err(e) => {
            match e.kind() {
                SessionErrorKind::Internal => error!(game_id = %game_id, error = %e, "Join check failed"),
                _ => warn!(game_id = %game_id, error = %e, "Join check rejected"),
            }
            GameResponse::failed(&e)
        }
    }
}
