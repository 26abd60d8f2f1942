//! Broadcast tick
//!
//! One tick pulls a single frame from the source and writes it to every
//! active client concurrently. Each client's part is bounded by the client
//! budget (the shorter of the write timeout and the frame interval), so a
//! tick never outlasts one frame interval no matter how slow a client is. A
//! client whose write fails, overruns the budget, or whose peer is gone is
//! flagged inactive and skipped from then on. The frame is released exactly
//! once per successful acquisition, whatever happened to the writes.

use std::io;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::frame::{CaptureError, FrameLease, FrameSource};
use crate::media::multipart::write_part;
use crate::registry::{ClientEntry, ClientId, ClientRegistry};
use crate::stats::FanoutCounters;
use crate::transport::Transport;

use super::config::FanoutConfig;
use super::state::FanoutState;

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No active clients; the source was not touched
    Idle,
    /// The source had no frame; nothing was sent
    CaptureFailed(CaptureError),
    /// A frame went out
    Broadcast(BroadcastReport),
}

/// Result of broadcasting one frame
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastReport {
    /// Source sequence number of the frame
    pub sequence: u64,
    /// Payload size
    pub frame_bytes: usize,
    /// Clients that received the frame
    pub delivered: usize,
    /// Clients flagged inactive during this tick
    pub dropped: Vec<ClientId>,
}

/// How one client's part write ended
#[derive(Debug)]
enum Delivery {
    Sent,
    Disconnected,
    Failed(io::Error),
    TimedOut,
}

async fn deliver<T: Transport>(
    entry: &mut ClientEntry<T>,
    jpeg: &[u8],
    budget: Duration,
) -> Delivery {
    if !entry.transport().is_connected() {
        return Delivery::Disconnected;
    }

    match tokio::time::timeout(budget, write_part(entry.transport_mut(), jpeg)).await {
        Ok(Ok(())) => Delivery::Sent,
        Ok(Err(e)) => Delivery::Failed(e),
        Err(_) => Delivery::TimedOut,
    }
}

/// The broadcast scheduler's state and counters
#[derive(Debug)]
pub struct FanoutLoop {
    state: FanoutState,
    counters: FanoutCounters,
    config: FanoutConfig,
}

impl FanoutLoop {
    /// Create a loop that starts counting now
    pub fn new(config: FanoutConfig) -> Self {
        Self {
            state: FanoutState::Idle,
            counters: FanoutCounters::new(),
            config,
        }
    }

    /// Current phase
    pub fn state(&self) -> FanoutState {
        self.state
    }

    /// Throughput counters
    pub fn counters(&self) -> &FanoutCounters {
        &self.counters
    }

    /// Loop configuration
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Run one broadcast tick
    pub async fn tick<S, T>(
        &mut self,
        registry: &mut ClientRegistry<T>,
        source: &mut S,
    ) -> TickOutcome
    where
        S: FrameSource,
        T: Transport,
    {
        if !self.state.is_idle() {
            // Previous tick was cancelled mid-flight
            tracing::debug!(state = ?self.state, "Resetting interrupted tick");
            self.state.reset();
        }

        if registry.active_count() == 0 {
            self.counters.idle_ticks += 1;
            return TickOutcome::Idle;
        }

        self.state.start_capture();

        let lease = match FrameLease::acquire(source) {
            Ok(lease) => lease,
            Err(e) => {
                self.state.capture_failed();
                self.counters.capture_failures += 1;
                tracing::debug!(error = %e, "Capture failed, skipping tick");
                return TickOutcome::CaptureFailed(e);
            }
        };

        self.state.capture_succeeded();

        let sequence = lease.frame().sequence;
        let frame_bytes = lease.len();
        let jpeg: &[u8] = &lease;
        let budget = self.config.client_budget();

        let writes = registry.active_entries_mut().map(|entry| async move {
            let delivery = deliver(&mut *entry, jpeg, budget).await;
            (entry, delivery)
        });
        let results = join_all(writes).await;

        let mut delivered = 0;
        let mut dropped = Vec::new();

        for (entry, delivery) in results {
            match delivery {
                Delivery::Sent => {
                    entry.record_delivery(frame_bytes, Instant::now());
                    delivered += 1;
                    continue;
                }
                Delivery::Disconnected => {
                    tracing::debug!(client_id = %entry.id(), "Client disconnected");
                }
                Delivery::Failed(e) => {
                    tracing::warn!(
                        client_id = %entry.id(),
                        error = %e,
                        "Client write failed"
                    );
                }
                Delivery::TimedOut => {
                    tracing::warn!(
                        client_id = %entry.id(),
                        budget_ms = budget.as_millis() as u64,
                        "Client too slow for frame rate"
                    );
                }
            }
            entry.mark_inactive();
            dropped.push(entry.id());
        }

        drop(lease);

        self.counters.frame_count += 1;
        self.counters.last_frame_bytes = frame_bytes;
        self.counters.deliveries += delivered as u64;
        self.counters.write_failures += dropped.len() as u64;
        self.state.finish_broadcast();

        tracing::trace!(
            sequence = sequence,
            bytes = frame_bytes,
            delivered = delivered,
            dropped = dropped.len(),
            "Frame broadcast"
        );

        TickOutcome::Broadcast(BroadcastReport {
            sequence,
            frame_bytes,
            delivered,
            dropped,
        })
    }
}

impl Default for FanoutLoop {
    fn default() -> Self {
        Self::new(FanoutConfig::default())
    }
}
