//! Registry configuration

use std::time::Duration;

/// Default subscriber capacity
pub const DEFAULT_MAX_CLIENTS: usize = 4;

/// Default interval between prune cycles
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest accepted prune interval
pub const MIN_PRUNE_INTERVAL: Duration = Duration::from_millis(1);

/// Client registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum simultaneous subscribers
    pub max_clients: usize,

    /// How often dead subscribers are pruned (and stats reported)
    pub prune_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

impl RegistryConfig {
    /// Set the subscriber capacity
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Set the prune interval, clamped to [`MIN_PRUNE_INTERVAL`]
    pub fn prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = interval.max(MIN_PRUNE_INTERVAL);
        self
    }
}
