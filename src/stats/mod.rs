//! Throughput and occupancy statistics

pub mod metrics;
pub mod reporter;

pub use metrics::{FanoutCounters, StatsSnapshot};
pub use reporter::StatsReporter;
