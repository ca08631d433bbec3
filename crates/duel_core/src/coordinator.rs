//! Entry point for transports: admission, moves and disconnects.

use crate::binding::ConnectionBindings;
use crate::broadcast::{Broadcaster, EventReceiver};
use crate::config::CoreConfig;
use crate::engine::{self, IgnoreReason, MoveOutcome};
use crate::error::{SessionError, SessionErrorKind};
use crate::events::{ClientEvent, ErrorCode, ServerEvent};
use crate::registry::{SessionRegistry, lock};
use crate::session::{ConnectionId, SessionId, SessionStatus};
use derive_getters::Getters;
use duel_board::Symbol;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const DISCONNECT_MESSAGE: &str = "Opponent disconnected";

/// A registered connection and its outbound event queue.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    events: EventReceiver,
}

impl Connection {
    /// Connection id, also used as the player id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the next outbound event. `None` once unregistered.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.events.try_recv().ok()
    }

    /// Splits into id and queue, for transports that drain the queue
    /// on a separate task.
    pub fn into_parts(self) -> (ConnectionId, EventReceiver) {
        (self.id, self.events)
    }
}

/// Coordinates sessions, connections and event delivery.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone, Getters)]
pub struct Coordinator {
    registry: SessionRegistry,
    bindings: ConnectionBindings,
    broadcaster: Broadcaster,
    config: CoreConfig,
}

impl Coordinator {
    /// Creates a coordinator with empty state.
    #[instrument]
    pub fn new(config: CoreConfig) -> Self {
        info!("Creating coordinator");
        Self {
            registry: SessionRegistry::new(),
            bindings: ConnectionBindings::new(),
            broadcaster: Broadcaster::new(),
            config,
        }
    }

    /// Creates a new waiting session.
    #[instrument(skip(self))]
    pub fn create_session(&self) -> SessionId {
        self.registry.create()
    }

    /// Checks that a session exists and has a free seat.
    ///
    /// Admits nobody; only refreshes the session's activity time.
    #[instrument(skip(self))]
    pub fn join_precheck(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self.registry.get(session_id)?;
        let mut session = lock(&handle)?;

        if session.is_retired() {
            return Err(SessionError::new(SessionErrorKind::NotFound));
        }
        if session.players().len() >= 2 {
            warn!("Game is full");
            return Err(SessionError::new(SessionErrorKind::Full));
        }

        session.touch();
        Ok(())
    }

    /// Registers a new connection and opens its event queue.
    #[instrument(skip(self))]
    pub fn connect(&self) -> Connection {
        let id = Uuid::new_v4().to_string();
        let events = self.broadcaster.register(&id);
        info!(connection_id = %id, "Connection registered");
        Connection { id, events }
    }

    /// Admits a connection into a session.
    ///
    /// The joiner gets `assigned`; when this fills the second seat both
    /// players get `gameStart`.
    #[instrument(skip(self))]
    pub fn join(
        &self,
        connection_id: &str,
        session_id: &str,
        display_name: &str,
    ) -> Result<Symbol, SessionError> {
        let stale = match self.bindings.session_of(connection_id) {
            Some(bound) if self.is_active(&bound) => {
                warn!(bound_to = %bound, "Connection already playing");
                return Err(SessionError::new(SessionErrorKind::AlreadyJoined));
            }
            other => other,
        };

        let handle = self.registry.get(session_id)?;
        let mut session = lock(&handle)?;
        let symbol = engine::admit(&mut session, connection_id, display_name)?;

        // A finished game keeps its binding until the new seat is taken.
        if let Some(stale) = stale {
            debug!(stale = %stale, "Dropping binding to finished session");
            self.bindings.unbind(connection_id);
        }
        self.bindings.bind(connection_id, session_id);

        self.broadcaster
            .send_to(connection_id, ServerEvent::Assigned { symbol });

        if let (SessionStatus::InProgress, Some(current)) =
            (session.status(), session.current_player())
        {
            let event = ServerEvent::GameStart {
                board: session.board().clone(),
                players: session.players().clone(),
                current_player: current.clone(),
            };
            let delivered = self.broadcaster.broadcast(session.player_ids(), &event);
            info!(delivered, "Game started");
        }

        Ok(symbol)
    }

    /// Submits a move.
    ///
    /// Illegal moves are dropped silently and reported only through the
    /// returned [`MoveOutcome::Ignored`]. Every accepted move emits
    /// exactly one `gameUpdate` to both players.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        connection_id: &str,
        session_id: &str,
        row: usize,
        col: usize,
    ) -> Result<MoveOutcome, SessionError> {
        let Ok(handle) = self.registry.get(session_id) else {
            return Ok(MoveOutcome::Ignored(IgnoreReason::SessionNotFound));
        };
        let mut session = lock(&handle)?;
        let outcome = engine::apply_move(&mut session, connection_id, row, col);

        let event = match &outcome {
            MoveOutcome::Continued { next } => Some(ServerEvent::GameUpdate {
                board: session.board().clone(),
                current_player: Some(next.clone()),
                is_over: false,
                winner: None,
            }),
            MoveOutcome::Won { winner } => Some(ServerEvent::GameUpdate {
                board: session.board().clone(),
                current_player: session.current_player().clone(),
                is_over: true,
                winner: Some(winner.display_name().clone()),
            }),
            MoveOutcome::Drawn => Some(ServerEvent::GameUpdate {
                board: session.board().clone(),
                current_player: session.current_player().clone(),
                is_over: true,
                winner: None,
            }),
            MoveOutcome::Ignored(_) => None,
        };

        if let Some(event) = event {
            self.broadcaster.broadcast(session.player_ids(), &event);
        }
        Ok(outcome)
    }

    /// Handles a lost connection.
    ///
    /// If the connection was playing an unfinished game, the session is
    /// abandoned, the remaining player is told they won, and the session
    /// is deleted. Finished sessions are deleted silently. Returns the id
    /// of the deleted session.
    #[instrument(skip(self))]
    pub fn disconnect(&self, connection_id: &str) -> Option<SessionId> {
        self.broadcaster.unregister(connection_id);

        let Some(session_id) = self.bindings.unbind(connection_id) else {
            debug!("Connection was not in a session");
            return None;
        };

        let Ok(handle) = self.registry.get(&session_id) else {
            debug!(session_id = %session_id, "Session already cleaned up");
            return None;
        };

        let mut session = match lock(&handle) {
            Ok(session) => session,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Dropping faulted session");
                self.registry.remove(&session_id);
                return Some(session_id);
            }
        };

        if session.is_retired() {
            return None;
        }

        if !session.status().is_terminal()
            && let Some(remaining) = engine::abandon(&mut session, connection_id)
        {
            let event = ServerEvent::PlayerDisconnected {
                message: DISCONNECT_MESSAGE.to_string(),
                winner: remaining.display_name().clone(),
            };
            self.broadcaster.send_to(remaining.connection_id(), event);
        }

        self.registry.evict_locked(&mut session);
        info!(session_id = %session_id, "Session closed after disconnect");
        Some(session_id)
    }

    /// Dispatches an inbound event for a connection.
    ///
    /// This is the error boundary for connection handlers: admission
    /// errors and internal faults, panics included, become an `error`
    /// event on this connection only.
    #[instrument(skip(self, event), fields(event = ?event))]
    pub fn handle(&self, connection_id: &str, event: ClientEvent) {
        let result = catch_unwind(AssertUnwindSafe(|| self.dispatch(connection_id, event)));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.report(connection_id, &e),
            Err(_) => {
                error!("Event handler panicked");
                self.report(connection_id, &SessionError::new(SessionErrorKind::Internal));
            }
        }
    }

    /// Tells a connection its frame could not be decoded.
    #[instrument(skip(self))]
    pub fn reject_malformed(&self, connection_id: &str, detail: &str) {
        warn!("Malformed frame");
        self.broadcaster.send_to(
            connection_id,
            ServerEvent::error(ErrorCode::Malformed, format!("Malformed request: {detail}")),
        );
    }

    /// Evicts idle sessions using the configured threshold.
    #[instrument(skip(self))]
    pub fn sweep_idle(&self) -> Vec<SessionId> {
        self.registry.sweep_idle(*self.config.idle_threshold())
    }

    fn dispatch(&self, connection_id: &str, event: ClientEvent) -> Result<(), SessionError> {
        match event {
            ClientEvent::JoinGame {
                game_id,
                player_name,
            } => self
                .join(connection_id, &game_id, &player_name)
                .map(|_| ()),
            ClientEvent::MakeMove { game_id, row, col } => {
                let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
                    debug!(row, col, "Ignoring move with negative coordinates");
                    return Ok(());
                };
                self.make_move(connection_id, &game_id, row, col)
                    .map(|_| ())
            }
        }
    }

    fn report(&self, connection_id: &str, err: &SessionError) {
        match err.kind() {
            SessionErrorKind::Internal => error!(connection_id, error = %err, "Request failed"),
            _ => warn!(connection_id, error = %err, "Request rejected"),
        }
        self.broadcaster.send_to(
            connection_id,
            ServerEvent::error(err.kind().into(), err.kind().to_string()),
        );
    }

    fn is_active(&self, session_id: &str) -> bool {
        let Ok(handle) = self.registry.get(session_id) else {
            return false;
        };
        match lock(&handle) {
            Ok(session) => !session.is_retired() && !session.status().is_terminal(),
            Err(_) => false,
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(connection: &mut Connection) -> Vec<ServerEvent> {
        std::iter::from_fn(|| connection.try_recv()).collect()
    }

    #[test]
    fn test_join_sends_assigned_then_start() {
        let coordinator = Coordinator::default();
        let game = coordinator.create_session();
        let mut alice = coordinator.connect();
        let mut bob = coordinator.connect();

        coordinator.join(alice.id(), &game, "Alice").unwrap();
        assert_eq!(drain(&mut alice), vec![ServerEvent::Assigned { symbol: Symbol::X }]);

        coordinator.join(bob.id(), &game, "Bob").unwrap();
        let bob_events = drain(&mut bob);
        assert_eq!(bob_events[0], ServerEvent::Assigned { symbol: Symbol::O });
        assert!(matches!(
            &bob_events[1],
            ServerEvent::GameStart { current_player, players, .. }
                if current_player == alice.id() && players.len() == 2
        ));
        assert!(matches!(drain(&mut alice)[..], [ServerEvent::GameStart { .. }]));
    }

    #[test]
    fn test_precheck_reports_full_and_missing() {
        let coordinator = Coordinator::default();
        let game = coordinator.create_session();
        assert!(coordinator.join_precheck(&game).is_ok());

        let alice = coordinator.connect();
        let bob = coordinator.connect();
        coordinator.join(alice.id(), &game, "Alice").unwrap();
        coordinator.join(bob.id(), &game, "Bob").unwrap();

        let err = coordinator.join_precheck(&game).unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::Full);

        let err = coordinator.join_precheck("ZZZZZZ").unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::NotFound);
    }

    #[test]
    fn test_ignored_move_emits_nothing() {
        let coordinator = Coordinator::default();
        let game = coordinator.create_session();
        let mut alice = coordinator.connect();
        let mut bob = coordinator.connect();
        coordinator.join(alice.id(), &game, "Alice").unwrap();
        coordinator.join(bob.id(), &game, "Bob").unwrap();
        drain(&mut alice);
        drain(&mut bob);

        let outcome = coordinator.make_move(bob.id(), &game, 0, 0).unwrap();
        assert_eq!(outcome, MoveOutcome::Ignored(IgnoreReason::NotYourTurn));
        assert!(drain(&mut alice).is_empty());
        assert!(drain(&mut bob).is_empty());
    }

    #[test]
    fn test_handle_reports_admission_errors() {
        let coordinator = Coordinator::default();
        let mut carol = coordinator.connect();

        coordinator.handle(
            carol.id(),
            ClientEvent::JoinGame {
                game_id: "NOPE00".to_string(),
                player_name: "Carol".to_string(),
            },
        );

        assert_eq!(
            drain(&mut carol),
            vec![ServerEvent::error(ErrorCode::NotFound, "Game not found")]
        );
        assert!(coordinator.bindings().session_of(carol.id()).is_none());
    }

    #[test]
    fn test_handle_drops_negative_coordinates() {
        let coordinator = Coordinator::default();
        let game = coordinator.create_session();
        let mut alice = coordinator.connect();
        let mut bob = coordinator.connect();
        coordinator.join(alice.id(), &game, "Alice").unwrap();
        coordinator.join(bob.id(), &game, "Bob").unwrap();
        drain(&mut alice);
        drain(&mut bob);

        coordinator.handle(
            alice.id(),
            ClientEvent::MakeMove {
                game_id: game.clone(),
                row: -1,
                col: 0,
            },
        );

        assert!(drain(&mut alice).is_empty());
        let session = coordinator.registry().snapshot(&game).unwrap();
        assert_eq!(session.current_player().as_deref(), Some(alice.id()));
    }

    #[test]
    fn test_second_join_while_playing_is_rejected() {
        let coordinator = Coordinator::default();
        let first = coordinator.create_session();
        let second = coordinator.create_session();
        let alice = coordinator.connect();

        coordinator.join(alice.id(), &first, "Alice").unwrap();
        let err = coordinator.join(alice.id(), &second, "Alice").unwrap_err();
        assert_eq!(err.kind(), SessionErrorKind::AlreadyJoined);
        assert!(coordinator.registry().snapshot(&second).unwrap().players().is_empty());
    }

    #[test]
    fn test_disconnect_unbound_is_noop() {
        let coordinator = Coordinator::default();
        let game = coordinator.create_session();
        let lurker = coordinator.connect();

        assert_eq!(coordinator.disconnect(lurker.id()), None);
        assert!(coordinator.registry().contains(&game));
        assert!(coordinator.broadcaster().is_empty());
    }
}
