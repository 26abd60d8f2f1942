//! In-memory subscriber transport
//!
//! Records everything written to it and can be told to fail, stall, slow
//! down or disconnect. The paired [`MemoryHandle`] stays with the caller after the
//! transport itself has moved into the registry.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::Transport;

#[derive(Debug, Default)]
struct MemoryState {
    written: Vec<u8>,
    writes: usize,
    fail_writes: bool,
    stall_writes: bool,
    write_delay: Duration,
    disconnected: bool,
}

/// Transport backed by a shared byte buffer
#[derive(Debug)]
pub struct MemoryTransport {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

/// Inspection and control handle for a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// Create a transport and its handle
    pub fn new(name: impl Into<String>) -> (Self, MemoryHandle) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        let transport = Self {
            name: name.into(),
            state: Arc::clone(&state),
        };
        (transport, MemoryHandle { state })
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for MemoryTransport {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let (stall, delay) = {
            let state = lock(&self.state);
            if state.disconnected {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "disconnected"));
            }
            if state.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
            }
            (state.stall_writes, state.write_delay)
        };

        if stall {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        state.written.extend_from_slice(buf);
        state.writes += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !lock(&self.state).disconnected
    }

    fn peer(&self) -> String {
        self.name.clone()
    }
}

impl MemoryHandle {
    /// Copy of everything written so far
    pub fn written(&self) -> Vec<u8> {
        lock(&self.state).written.clone()
    }

    /// Number of successful `write_all` calls
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Make subsequent writes hang forever
    pub fn stall_writes(&self, stall: bool) {
        lock(&self.state).stall_writes = stall;
    }

    /// Make every subsequent write take `delay` before succeeding
    pub fn delay_writes(&self, delay: Duration) {
        lock(&self.state).write_delay = delay;
    }

    /// Simulate the peer going away
    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_writes() {
        let (mut transport, handle) = MemoryTransport::new("a");

        transport.write_all(b"--frame\r\n").await.unwrap();
        transport.write_all(b"data").await.unwrap();

        assert_eq!(handle.written(), b"--frame\r\ndata");
        assert_eq!(handle.write_count(), 2);
        assert_eq!(transport.peer(), "a");
    }

    #[tokio::test]
    async fn test_failure_and_disconnect() {
        let (mut transport, handle) = MemoryTransport::new("b");

        handle.fail_writes(true);
        assert!(transport.write_all(b"x").await.is_err());
        assert!(transport.is_connected());

        handle.fail_writes(false);
        handle.disconnect();
        assert!(!transport.is_connected());
        assert!(transport.write_all(b"x").await.is_err());
        assert!(handle.written().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_never_completes() {
        let (mut transport, handle) = MemoryTransport::new("c");
        handle.stall_writes(true);

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            transport.write_all(b"x"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_write_succeeds() {
        let (mut transport, handle) = MemoryTransport::new("d");
        handle.delay_writes(Duration::from_millis(150));

        let start = tokio::time::Instant::now();
        transport.write_all(b"slow").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(handle.written(), b"slow");
    }
}
