//! Frame fanout
//!
//! The fanout loop is the single producer side of the stream: at a bounded
//! cadence it takes one frame from the source and pushes it to every live
//! subscriber. A separate, slower cycle prunes dead subscribers and reports
//! stats.
//!
//! ```text
//!   broadcast task (frame_interval)        prune task (prune_interval)
//!          │                                        │
//!          ▼                                        ▼
//!   ┌────────────── FanoutService: Mutex<FanoutCore> ──────────────┐
//!   │  source.acquire ─► registry.active_entries_mut ─► release    │
//!   │                         (write_part per client)              │
//!   │                                   registry.prune ─► stats    │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod service;
pub mod state;
pub mod tick;

pub use config::FanoutConfig;
pub use service::{FanoutCore, FanoutService};
pub use state::FanoutState;
pub use tick::{BroadcastReport, FanoutLoop, TickOutcome};
