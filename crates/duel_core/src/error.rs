//! Session error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong while handling a session request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SessionErrorKind {
    /// No live session with the requested id.
    #[display("Game not found")]
    NotFound,

    /// The session already has two players.
    #[display("Game is full")]
    Full,

    /// The connection already plays in a live session.
    #[display("Already joined a game")]
    AlreadyJoined,

    /// Unexpected failure inside the core.
    #[display("Internal server error")]
    Internal,
}

/// Session error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Session error: {} at {}:{}", kind, file, line)]
pub struct SessionError {
    /// Error category, used to pick the code sent to clients.
    pub kind: SessionErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SessionError {
    /// Creates a new session error with caller location tracking.
    #[track_caller]
    #[instrument]
    pub fn new(kind: SessionErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> SessionErrorKind {
        self.kind
    }
}

impl From<SessionErrorKind> for SessionError {
    #[track_caller]
    fn from(kind: SessionErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_records_caller_location() {
        let err = SessionError::new(SessionErrorKind::Full);
        assert_eq!(err.kind(), SessionErrorKind::Full);
        assert!(err.file.ends_with("error.rs"));
        assert!(err.to_string().starts_with("Session error: Game is full at "));
    }
}
