//! Statistics and metrics for the fanout loop

use std::fmt;
use std::time::{Duration, Instant};

/// Counters owned and updated by the fanout loop
#[derive(Debug, Clone)]
pub struct FanoutCounters {
    /// When the loop started
    pub started_at: Instant,
    /// Frames broadcast (once per tick, regardless of client count)
    pub frame_count: u64,
    /// Size of the most recent broadcast frame
    pub last_frame_bytes: usize,
    /// Ticks skipped because nobody was subscribed
    pub idle_ticks: u64,
    /// Ticks skipped because the source had no frame
    pub capture_failures: u64,
    /// Successful per-client frame deliveries
    pub deliveries: u64,
    /// Per-client write failures and timeouts
    pub write_failures: u64,
}

impl FanoutCounters {
    /// Start counting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start counting at a given instant
    pub fn starting_at(started_at: Instant) -> Self {
        Self {
            started_at,
            frame_count: 0,
            last_frame_bytes: 0,
            idle_ticks: 0,
            capture_failures: 0,
            deliveries: 0,
            write_failures: 0,
        }
    }
}

impl Default for FanoutCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived view of fanout throughput and registry occupancy
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    /// Entries currently being served
    pub active_clients: usize,
    /// Registry capacity
    pub capacity: usize,
    /// Frames broadcast since start
    pub frame_count: u64,
    /// Time since the loop started
    pub elapsed: Duration,
    /// `frame_count / elapsed`, or 0.0 when no time has elapsed
    pub frames_per_second: f64,
    /// Size of the most recent broadcast frame
    pub last_frame_bytes: usize,
    /// Ticks skipped for lack of subscribers
    pub idle_ticks: u64,
    /// Ticks skipped for lack of a frame
    pub capture_failures: u64,
    /// Per-client write failures
    pub write_failures: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FPS: {:.2}, last frame size: {} bytes, clients: {}/{}",
            self.frames_per_second, self.last_frame_bytes, self.active_clients, self.capacity
        )
    }
}

/// Frames per second over `elapsed`, 0.0 when `elapsed` is zero
pub fn frames_per_second(frame_count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        frame_count as f64 / secs
    } else {
        0.0
    }
}
