//! Process-wide session store.

use crate::error::{SessionError, SessionErrorKind};
use crate::session::{Session, SessionId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Shared handle to one session. Lock it to read or mutate.
pub type SessionHandle = Arc<Mutex<Session>>;

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ID_LEN: usize = 6;

/// Manages all game sessions.
///
/// The map only hands out [`SessionHandle`]s; every mutation happens
/// under the per-session lock, so operations on different sessions
/// never wait on each other. Lock order is always session lock first,
/// map shard second: lookups copy the handle out and release the shard
/// before locking.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    /// Creates a waiting session under a fresh id and returns the id.
    ///
    /// Ids are short codes meant to be typed by people, so collisions
    /// with live sessions are checked and regenerated.
    #[instrument(skip(self))]
    pub fn create(&self) -> SessionId {
        let mut rng = rand::thread_rng();
        loop {
            let id = generate_id(&mut rng);
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => {
                    warn!(session_id = %id, "Session id collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(Session::new(id.clone()))));
                    info!(session_id = %id, "Created new session");
                    return id;
                }
            }
        }
    }

    /// Gets the handle for a session.
    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<SessionHandle, SessionError> {
        // Clone out of the shard guard before anyone locks the session.
        let handle = self.sessions.get(id).map(|entry| Arc::clone(entry.value()));
        handle.ok_or_else(|| {
            debug!(session_id = id, "Session not found");
            SessionError::new(SessionErrorKind::NotFound)
        })
    }

    /// Returns a copy of the session's current state.
    #[instrument(skip(self))]
    pub fn snapshot(&self, id: &str) -> Result<Session, SessionError> {
        let handle = self.get(id)?;
        let session = lock(&handle)?;
        Ok(session.clone())
    }

    /// Returns true if a live session has this id.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Deletes a session. Removing an absent id is a no-op.
    ///
    /// Must not be called while holding that session's lock.
    #[instrument(skip(self))]
    pub fn remove(&self, id: &str) -> bool {
        let Ok(handle) = self.get(id) else {
            debug!(session_id = id, "Remove of absent session");
            return false;
        };
        let removed = match handle.lock() {
            Ok(mut session) => self.evict_locked(&mut session),
            Err(poisoned) => self.evict_locked(&mut poisoned.into_inner()),
        };
        removed
    }

    /// Detaches a session whose lock the caller already holds.
    ///
    /// Anyone still holding a handle sees the session as retired and
    /// treats it as gone.
    pub(crate) fn evict_locked(&self, session: &mut Session) -> bool {
        if session.retired {
            return false;
        }
        session.retired = true;
        let removed = self.sessions.remove(&session.id).is_some();
        debug!(session_id = %session.id, removed, "Session evicted");
        removed
    }

    /// Deletes every session idle for longer than `threshold`.
    ///
    /// Each session is locked only while it is checked, so in-flight
    /// operations on a session finish before it can be evicted and
    /// unrelated sessions are never blocked.
    #[instrument(skip(self))]
    pub fn sweep_idle(&self, threshold: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        let candidates: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut removed = Vec::new();
        for handle in candidates {
            let mut session = match handle.lock() {
                Ok(session) => session,
                Err(poisoned) => {
                    error!("Evicting session with poisoned lock");
                    poisoned.into_inner()
                }
            };
            if session.idle_for(now) > threshold && self.evict_locked(&mut session) {
                removed.push(session.id.clone());
            }
        }

        debug!(
            removed = removed.len(),
            remaining = self.sessions.len(),
            "Idle sweep finished"
        );
        removed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Lists all live session ids.
    #[instrument(skip(self))]
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Locks a session, reporting a poisoned lock as an internal fault.
pub(crate) fn lock(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>, SessionError> {
    handle.lock().map_err(|_| {
        error!("Session lock poisoned");
        SessionError::new(SessionErrorKind::Internal)
    })
}

fn generate_id(rng: &mut impl Rng) -> SessionId {
    (0..ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}
