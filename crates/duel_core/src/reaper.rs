//! Background eviction of idle sessions.

use crate::coordinator::Coordinator;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument};

/// Periodic sweeper removing sessions with no recent activity.
///
/// Evicted sessions get no client notification; their players are
/// expected to be gone already. Bindings that still point at an evicted
/// session are dropped lazily on the next join or disconnect.
#[derive(Debug)]
pub struct IdleReaper {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl IdleReaper {
    /// Starts the reaper on the current tokio runtime.
    ///
    /// The period and threshold come from the coordinator's config.
    #[instrument(skip(coordinator))]
    pub fn spawn(coordinator: Coordinator) -> Self {
        let period = *coordinator.config().reap_interval();
        let (shutdown, mut stop) = watch::channel(false);

        info!(
            period_secs = period.as_secs(),
            threshold_secs = coordinator.config().idle_threshold().as_secs(),
            "Starting idle reaper"
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = coordinator.sweep_idle();
                        for session_id in &removed {
                            info!(session_id = %session_id, "Cleaned up inactive game");
                        }
                        debug!(removed = removed.len(), "Reaper pass complete");
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Idle reaper stopped");
        });

        Self { task, shutdown }
    }

    /// Stops the reaper and waits for the current pass to finish.
    #[instrument(skip(self))]
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
