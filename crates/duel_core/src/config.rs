//! Core timing configuration.

use derive_getters::Getters;
use derive_setters::Setters;
use std::time::Duration;

/// Default period between idle sweeps.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default inactivity after which a session is evicted.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(30 * 60);

/// Timing policy for the session core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct CoreConfig {
    /// How often the idle reaper runs.
    reap_interval: Duration,
    /// How long a session may go without activity before it is evicted.
    idle_threshold: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            reap_interval: DEFAULT_REAP_INTERVAL,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_thirty_minutes() {
        let config = CoreConfig::default();
        assert_eq!(*config.reap_interval(), Duration::from_secs(1800));
        assert_eq!(*config.idle_threshold(), Duration::from_secs(1800));
    }

    #[test]
    fn test_setters_override() {
        let config = CoreConfig::default()
            .with_reap_interval(Duration::from_secs(5))
            .with_idle_threshold(Duration::from_secs(60));
        assert_eq!(*config.reap_interval(), Duration::from_secs(5));
        assert_eq!(*config.idle_threshold(), Duration::from_secs(60));
    }
}
