//! HTTP front end
//!
//! Accepts connections, reads one request head, and either hands the
//! connection to the registry as a stream subscriber or answers with a
//! single small response.

pub mod admission;
pub mod config;
pub mod http;
pub mod listener;

pub use admission::Admission;
pub use config::ServerConfig;
pub use listener::{StreamServer, STATS_PATH, STATUS_PATH, STREAM_PATH};
