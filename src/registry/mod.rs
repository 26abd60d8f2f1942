//! Client registry for stream subscribers
//!
//! The registry holds every connected subscriber, bounded by a hard capacity.
//! The fanout loop walks it once per frame; a slower prune cycle drops
//! entries whose writes failed or whose peer went away.
//!
//! # Architecture
//!
//! ```text
//!   admission ──► admit() ──►┌──────────────────────────────┐
//!                            │ entries: Vec<ClientEntry> {  │
//!                            │   transport, active,         │
//!                            │   last_frame_at, ...         │
//!                            │ }   (len <= max_clients)     │
//!                            └──────────────┬───────────────┘
//!                                           │
//!             ┌─────────────────────────────┼──────────────────────┐
//!             ▼                             ▼                      ▼
//!   active_entries_mut()           mark_inactive()             prune()
//!   (fanout, every frame)       (on write failure)      (every prune_interval)
//! ```
//!
//! # Liveness
//!
//! An entry leaves the registry only through `prune`. Between a failure and
//! the next prune it stays in place but inactive, so it is skipped by the
//! fanout and still counts against capacity.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{ClientEntry, ClientId, ClientSummary};
pub use error::{Rejected, RegistryError};
pub use store::ClientRegistry;
