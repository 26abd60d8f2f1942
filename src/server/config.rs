//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum requests being read or answered at once (0 = unlimited)
    ///
    /// Admitted stream subscribers do not count; they are bounded by the
    /// registry capacity.
    pub max_pending_requests: usize,

    /// Request head must arrive within this time
    pub request_timeout: Duration,

    /// Largest accepted request head in bytes
    pub max_request_size: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_pending_requests: 8,
            request_timeout: Duration::from_secs(5),
            max_request_size: 8 * 1024,
            tcp_nodelay: true, // Frames should leave as soon as they are written
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the pending request limit
    pub fn max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }

    /// Set the request head timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the request head size limit
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.max_request_size = size;
        self
    }
}
