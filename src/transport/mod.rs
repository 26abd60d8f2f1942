//! Subscriber transports
//!
//! A transport is the write half of one subscriber connection. The fanout
//! loop only needs two things from it: push bytes, and report whether the
//! peer is still there. Both must come back promptly; the loop additionally
//! bounds every write with a timeout so a hung peer cannot stall delivery to
//! the others.

pub mod memory;
pub mod tcp;

use std::future::Future;
use std::io;

pub use memory::{MemoryHandle, MemoryTransport};
pub use tcp::TcpTransport;

/// Write half of a subscriber connection
pub trait Transport: Send {
    /// Write the whole buffer
    fn write_all(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Non-blocking liveness check
    ///
    /// Returns `false` once the peer has gone away or a write has failed.
    fn is_connected(&self) -> bool;

    /// Human-readable peer description for logs
    fn peer(&self) -> String;
}
