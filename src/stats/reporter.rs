//! Stats snapshots
//!
//! Snapshots are computed on demand from the fanout counters and the
//! registry; nothing is stored and nothing is mutated.

use std::time::Instant;

use super::metrics::{frames_per_second, FanoutCounters, StatsSnapshot};
use crate::registry::ClientRegistry;
use crate::transport::Transport;

/// Derives [`StatsSnapshot`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsReporter;

impl StatsReporter {
    /// Snapshot as of now
    pub fn snapshot<T: Transport>(
        counters: &FanoutCounters,
        registry: &ClientRegistry<T>,
    ) -> StatsSnapshot {
        Self::snapshot_at(counters, registry, Instant::now())
    }

    /// Snapshot as of `now`
    pub fn snapshot_at<T: Transport>(
        counters: &FanoutCounters,
        registry: &ClientRegistry<T>,
        now: Instant,
    ) -> StatsSnapshot {
        let elapsed = now.saturating_duration_since(counters.started_at);

        StatsSnapshot {
            active_clients: registry.active_count(),
            capacity: registry.capacity(),
            frame_count: counters.frame_count,
            elapsed,
            frames_per_second: frames_per_second(counters.frame_count, elapsed),
            last_frame_bytes: counters.last_frame_bytes,
            idle_ticks: counters.idle_ticks,
            capture_failures: counters.capture_failures,
            write_failures: counters.write_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registry::RegistryConfig;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_sentinel_at_zero_elapsed() {
        let start = Instant::now();
        let mut counters = FanoutCounters::starting_at(start);
        counters.frame_count = 10;
        let registry: ClientRegistry<MemoryTransport> = ClientRegistry::new();

        let snapshot = StatsReporter::snapshot_at(&counters, &registry, start);
        assert_eq!(snapshot.elapsed, Duration::ZERO);
        assert_eq!(snapshot.frames_per_second, 0.0);
    }

    #[test]
    fn test_snapshot_reads_registry() {
        let start = Instant::now();
        let mut counters = FanoutCounters::starting_at(start);
        counters.frame_count = 40;
        counters.last_frame_bytes = 2048;

        let mut registry = ClientRegistry::with_config(RegistryConfig::default().max_clients(3));
        let (a, _) = MemoryTransport::new("a");
        let (b, _) = MemoryTransport::new("b");
        let a = registry.admit(a).unwrap();
        registry.admit(b).unwrap();
        registry.mark_inactive(a);

        let snapshot =
            StatsReporter::snapshot_at(&counters, &registry, start + Duration::from_secs(4));
        assert_eq!(snapshot.active_clients, 1);
        assert_eq!(snapshot.capacity, 3);
        assert_eq!(snapshot.last_frame_bytes, 2048);
        assert!((snapshot.frames_per_second - 10.0).abs() < 1e-9);

        // Observing does not change anything
        assert_eq!(registry.len(), 2);
        assert_eq!(counters.frame_count, 40);
    }

    #[test]
    fn test_clock_before_start_is_zero() {
        let counters = FanoutCounters::new();
        let registry: ClientRegistry<MemoryTransport> = ClientRegistry::new();
        let earlier = counters.started_at - Duration::from_millis(5);

        let snapshot = StatsReporter::snapshot_at(&counters, &registry, earlier);
        assert_eq!(snapshot.elapsed, Duration::ZERO);
        assert_eq!(snapshot.frames_per_second, 0.0);
    }
}
