//! Fire-and-forget event delivery to connections.

use crate::events::ServerEvent;
use crate::session::ConnectionId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Sending half of a connection's outbound queue.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half of a connection's outbound queue, drained by the
/// transport's writer task.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Outbound queues of every live connection.
///
/// Queues are unbounded so a send never waits: a slow reader only
/// grows its own queue and a closed one just drops the event.
#[derive(Debug, Clone, Default)]
pub struct Broadcaster {
    senders: Arc<DashMap<ConnectionId, EventSender>>,
}

impl Broadcaster {
    /// Creates an empty broadcaster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an outbound queue for a connection.
    #[instrument(skip(self))]
    pub fn register(&self, connection_id: &str) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.senders.insert(connection_id.to_string(), tx).is_some() {
            warn!("Replaced existing outbound queue");
        }
        rx
    }

    /// Closes a connection's outbound queue.
    #[instrument(skip(self))]
    pub fn unregister(&self, connection_id: &str) {
        self.senders.remove(connection_id);
    }

    /// Sends an event to one connection. Returns false if it is gone.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn send_to(&self, connection_id: &str, event: ServerEvent) -> bool {
        // Copy the sender out so no shard lock is held while sending.
        let sender = self.senders.get(connection_id).map(|s| s.value().clone());
        let Some(sender) = sender else {
            debug!("No outbound queue for connection");
            return false;
        };
        if sender.send(event).is_err() {
            debug!("Outbound queue closed, dropping event");
            return false;
        }
        true
    }

    /// Sends an event to every listed connection. Returns how many got it.
    pub fn broadcast<'a>(
        &self,
        recipients: impl IntoIterator<Item = &'a str>,
        event: &ServerEvent,
    ) -> usize {
        recipients
            .into_iter()
            .filter(|connection_id| self.send_to(connection_id, event.clone()))
            .count()
    }

    /// Number of open outbound queues.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Returns true if no queue is open.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_board::Symbol;

    #[test]
    fn test_send_to_registered_connection() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.register("c1");

        assert!(broadcaster.send_to("c1", ServerEvent::Assigned { symbol: Symbol::X }));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Assigned { symbol: Symbol::X });
    }

    #[test]
    fn test_send_to_unknown_or_closed_is_dropped() {
        let broadcaster = Broadcaster::new();
        assert!(!broadcaster.send_to("ghost", ServerEvent::Assigned { symbol: Symbol::O }));

        let rx = broadcaster.register("c1");
        drop(rx);
        assert!(!broadcaster.send_to("c1", ServerEvent::Assigned { symbol: Symbol::O }));
    }

    #[test]
    fn test_broadcast_skips_dead_recipients() {
        let broadcaster = Broadcaster::new();
        let mut live = broadcaster.register("c1");
        drop(broadcaster.register("c2"));

        let event = ServerEvent::Assigned { symbol: Symbol::X };
        assert_eq!(broadcaster.broadcast(["c1", "c2", "c3"], &event), 1);
        assert_eq!(live.try_recv().unwrap(), event);
    }
}
