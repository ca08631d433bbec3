//! Connection-to-session binding table.

use crate::session::{ConnectionId, SessionId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tracks which session each live connection plays in.
///
/// Holds ids only; the session itself is always resolved through the
/// registry, so a binding that outlives its session is harmless.
#[derive(Debug, Clone, Default)]
pub struct ConnectionBindings {
    bindings: Arc<DashMap<ConnectionId, SessionId>>,
}

impl ConnectionBindings {
    /// Creates an empty binding table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a session.
    ///
    /// Returns false, leaving the table unchanged, if the connection is
    /// already bound.
    #[instrument(skip(self))]
    pub fn bind(&self, connection_id: &str, session_id: &str) -> bool {
        match self.bindings.entry(connection_id.to_string()) {
            Entry::Occupied(existing) => {
                debug!(bound_to = %existing.get(), "Connection already bound");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(session_id.to_string());
                true
            }
        }
    }

    /// Session the connection is bound to, if any.
    pub fn session_of(&self, connection_id: &str) -> Option<SessionId> {
        self.bindings
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Removes the connection's binding and returns the session it had.
    #[instrument(skip(self))]
    pub fn unbind(&self, connection_id: &str) -> Option<SessionId> {
        self.bindings
            .remove(connection_id)
            .map(|(_, session_id)| session_id)
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no connection is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
