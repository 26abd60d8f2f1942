//! Client entry types
//!
//! This module defines the per-subscriber state stored in the registry.

use std::fmt;
use std::time::{Duration, Instant};

use crate::transport::Transport;

/// Registry-assigned subscriber identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One subscribed connection
///
/// Once `active` is cleared the entry is never written to again and the
/// next prune removes it.
pub struct ClientEntry<T> {
    id: ClientId,

    /// Exclusively owned write half of the connection
    transport: T,

    /// When the client was admitted
    admitted_at: Instant,

    /// Last successful frame delivery (admission time until the first frame)
    last_frame_at: Instant,

    /// Cleared on write failure or detected disconnect
    active: bool,

    /// Frames delivered
    frames_sent: u64,

    /// Payload bytes delivered
    bytes_sent: u64,
}

impl<T: Transport> ClientEntry<T> {
    pub(super) fn new(id: ClientId, transport: T, now: Instant) -> Self {
        Self {
            id,
            transport,
            admitted_at: now,
            last_frame_at: now,
            active: true,
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Subscriber ID
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Whether the entry may still be written to
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop delivering to this entry; idempotent
    pub fn mark_inactive(&mut self) {
        self.active = false;
    }

    /// Whether the entry survives the next prune
    pub fn is_live(&self) -> bool {
        self.active && self.transport.is_connected()
    }

    /// Mutable access to the transport for delivery
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Shared access to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Record a successful frame delivery
    pub fn record_delivery(&mut self, bytes: usize, now: Instant) {
        self.last_frame_at = now;
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Timestamp of the last successful delivery
    pub fn last_frame_at(&self) -> Instant {
        self.last_frame_at
    }

    /// Frames delivered to this entry
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Summary for status reporting
    pub fn summary(&self, now: Instant) -> ClientSummary {
        ClientSummary {
            id: self.id,
            peer: self.transport.peer(),
            active: self.active,
            frames_sent: self.frames_sent,
            bytes_sent: self.bytes_sent,
            connected_for: now.saturating_duration_since(self.admitted_at),
            since_last_frame: now.saturating_duration_since(self.last_frame_at),
        }
    }
}

/// Point-in-time view of one subscriber
#[derive(Debug, Clone)]
pub struct ClientSummary {
    /// Subscriber ID
    pub id: ClientId,
    /// Peer description
    pub peer: String,
    /// Whether the entry is still being served
    pub active: bool,
    /// Frames delivered
    pub frames_sent: u64,
    /// Payload bytes delivered
    pub bytes_sent: u64,
    /// Time since admission
    pub connected_for: Duration,
    /// Time since the last successful delivery
    pub since_last_frame: Duration,
}
