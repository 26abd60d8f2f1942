//! Fanout service
//!
//! Owns the registry, the broadcast loop and the frame source behind a
//! single lock, and drives the two periodic tasks: the fast broadcast tick
//! and the slower prune cycle. Admission, pruning and broadcasting each take
//! the lock for the duration of one short unit of work, so they never
//! interleave on the registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::frame::FrameSource;
use crate::registry::config::MIN_PRUNE_INTERVAL;
use crate::registry::{ClientId, ClientRegistry, ClientSummary, RegistryConfig};
use crate::stats::{StatsReporter, StatsSnapshot};
use crate::transport::Transport;

use super::config::FanoutConfig;
use super::tick::{FanoutLoop, TickOutcome};

/// Everything guarded by the service lock
pub struct FanoutCore<S, T> {
    /// Connected subscribers
    pub registry: ClientRegistry<T>,
    /// Broadcast state and counters
    pub fanout: FanoutLoop,
    /// Frame producer
    pub source: S,
}

impl<S: FrameSource, T: Transport> FanoutCore<S, T> {
    /// Run one broadcast tick
    pub async fn broadcast_tick(&mut self) -> TickOutcome {
        self.fanout.tick(&mut self.registry, &mut self.source).await
    }

    /// Prune dead clients, then snapshot stats
    pub fn prune_tick(&mut self) -> (Vec<ClientId>, StatsSnapshot) {
        let removed = self.registry.prune();
        let snapshot = self.stats();
        (removed, snapshot)
    }

    /// Current stats
    pub fn stats(&self) -> StatsSnapshot {
        StatsReporter::snapshot(self.fanout.counters(), &self.registry)
    }
}

/// Shared handle to the streaming core
pub struct FanoutService<S, T> {
    core: Mutex<FanoutCore<S, T>>,
    fanout_config: FanoutConfig,
    prune_interval: Duration,
    capacity: usize,
}

impl<S, T> FanoutService<S, T>
where
    S: FrameSource + 'static,
    T: Transport + 'static,
{
    /// Create a service with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, RegistryConfig::default(), FanoutConfig::default())
    }

    /// Create a service with custom configuration
    pub fn with_config(
        source: S,
        registry_config: RegistryConfig,
        fanout_config: FanoutConfig,
    ) -> Self {
        let prune_interval = registry_config.prune_interval.max(MIN_PRUNE_INTERVAL);
        let capacity = registry_config.max_clients;

        Self {
            core: Mutex::new(FanoutCore {
                registry: ClientRegistry::with_config(registry_config),
                fanout: FanoutLoop::new(fanout_config.clone()),
                source,
            }),
            fanout_config,
            prune_interval,
            capacity,
        }
    }

    /// Lock the core for one unit of work
    pub async fn lock(&self) -> MutexGuard<'_, FanoutCore<S, T>> {
        self.core.lock().await
    }

    /// Broadcast configuration
    pub fn fanout_config(&self) -> &FanoutConfig {
        &self.fanout_config
    }

    /// Registry capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run one broadcast tick
    pub async fn broadcast_tick(&self) -> TickOutcome {
        self.core.lock().await.broadcast_tick().await
    }

    /// Run one prune cycle and log the resulting stats
    pub async fn prune_tick(&self) -> StatsSnapshot {
        let (removed, snapshot) = self.core.lock().await.prune_tick();

        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "Pruned inactive clients");
        }
        if snapshot.active_clients > 0 {
            tracing::info!(
                fps = snapshot.frames_per_second,
                last_frame_bytes = snapshot.last_frame_bytes,
                clients = snapshot.active_clients,
                capacity = snapshot.capacity,
                "{}",
                snapshot
            );
        }

        snapshot
    }

    /// Current stats
    pub async fn stats(&self) -> StatsSnapshot {
        self.core.lock().await.stats()
    }

    /// Per-client summaries in admission order
    pub async fn clients(&self) -> Vec<ClientSummary> {
        self.core.lock().await.registry.summaries()
    }

    /// Spawn the periodic broadcast task
    ///
    /// Ticks no faster than `frame_interval`; ticks missed while a slow
    /// broadcast was running are skipped, not replayed.
    pub fn spawn_broadcast_task(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let interval = service.fanout_config.tick_period();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                service.broadcast_tick().await;
            }
        })
    }

    /// Spawn the periodic prune task
    pub fn spawn_prune_task(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let interval = service.prune_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                service.prune_tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::frame::StillSource;
    use crate::media::multipart::encode_part;
    use crate::transport::MemoryTransport;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0x01, 0x02, 0x03, 0xFF, 0xD9];

    fn service(max: usize) -> Arc<FanoutService<StillSource, MemoryTransport>> {
        let source = StillSource::new(Bytes::from_static(JPEG)).unwrap();
        Arc::new(FanoutService::with_config(
            source,
            RegistryConfig::default()
                .max_clients(max)
                .prune_interval(Duration::from_millis(1000)),
            FanoutConfig::default().frame_interval(Duration::from_millis(50)),
        ))
    }

    #[tokio::test]
    async fn test_example_scenario() {
        let service = service(2);

        let (a, handle_a) = MemoryTransport::new("A");
        let (b, handle_b) = MemoryTransport::new("B");
        let (c, _) = MemoryTransport::new("C");
        {
            let mut core = service.lock().await;
            core.registry.admit(a).unwrap();
            let b_id = core.registry.admit(b).unwrap();
            assert!(core.registry.admit(c).is_err());
            assert_eq!(core.registry.ids().len(), 2);
            assert!(core.registry.get(b_id).is_some());
        }

        let outcome = service.broadcast_tick().await;
        assert!(matches!(outcome, TickOutcome::Broadcast(ref r) if r.delivered == 2));
        assert_eq!(handle_a.written(), encode_part(JPEG).to_vec());
        assert_eq!(handle_b.written(), encode_part(JPEG).to_vec());

        handle_a.disconnect();
        let snapshot = service.prune_tick().await;
        assert_eq!(snapshot.active_clients, 1);
        assert_eq!(snapshot.frame_count, 1);

        let (c, _) = MemoryTransport::new("C");
        assert!(service.lock().await.registry.admit(c).is_ok());
        let peers: Vec<String> = service.clients().await.into_iter().map(|c| c.peer).collect();
        assert_eq!(peers, vec!["B", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_task_cadence() {
        let service = service(2);
        let (a, handle) = MemoryTransport::new("a");
        service.lock().await.registry.admit(a).unwrap();

        let task = service.spawn_broadcast_task();

        // First tick fires immediately, then every 50ms
        tokio::time::sleep(Duration::from_millis(125)).await;
        task.abort();

        let stats = service.stats().await;
        assert_eq!(stats.frame_count, 3);
        assert_eq!(handle.write_count(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_task_removes_dead_clients() {
        let service = service(2);
        let (a, handle) = MemoryTransport::new("a");
        service.lock().await.registry.admit(a).unwrap();

        let task = service.spawn_prune_task();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(service.lock().await.registry.len(), 1);

        handle.disconnect();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(service.lock().await.registry.is_empty());

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_capture_without_clients() {
        let service = service(2);
        let task = service.spawn_broadcast_task();

        tokio::time::sleep(Duration::from_millis(500)).await;
        task.abort();

        let core = service.lock().await;
        assert_eq!(core.source.frames_captured(), 0);
        assert!(core.fanout.counters().idle_ticks > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_client_does_not_throttle_others() {
        let service = service(2);
        let (fast, fast_handle) = MemoryTransport::new("fast");
        let (slow, slow_handle) = MemoryTransport::new("slow");
        slow_handle.delay_writes(Duration::from_millis(150));
        {
            let mut core = service.lock().await;
            core.registry.admit(fast).unwrap();
            core.registry.admit(slow).unwrap();
        }

        let task = service.spawn_broadcast_task();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let start = tokio::time::Instant::now();
        let stats = service.stats().await;
        assert!(start.elapsed() <= Duration::from_millis(50));
        task.abort();

        // One frame per 50ms for the client that keeps up
        assert!(fast_handle.write_count() / 3 >= 18);
        assert!(stats.frame_count >= 18);
        assert_eq!(stats.active_clients, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_intervals_still_tick() {
        let source = StillSource::new(Bytes::from_static(JPEG)).unwrap();
        let service = Arc::new(FanoutService::with_config(
            source,
            RegistryConfig::default().prune_interval(Duration::ZERO),
            FanoutConfig::default().max_fps(2_000_000_000),
        ));
        let (a, handle) = MemoryTransport::new("a");
        service.lock().await.registry.admit(a).unwrap();

        let broadcast = service.spawn_broadcast_task();
        let prune = service.spawn_prune_task();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(!broadcast.is_finished());
        assert!(!prune.is_finished());
        assert!(handle.write_count() > 0);

        broadcast.abort();
        prune.abort();
    }
}
