//! MJPEG server listener
//!
//! Handles the TCP accept loop and routes each request. Stream subscribers
//! are handed to the registry and their connection task ends; every other
//! request gets a single response and the connection is closed.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::fanout::{FanoutConfig, FanoutService};
use crate::frame::FrameSource;
use crate::registry::RegistryConfig;
use crate::server::admission::{self, Admission};
use crate::server::config::ServerConfig;
use crate::server::http::{self, Method};
use crate::transport::TcpTransport;

/// Path of the multipart stream
pub const STREAM_PATH: &str = "/stream";

/// Path of the status page
pub const STATUS_PATH: &str = "/";

/// Path of the plain-text stats
pub const STATS_PATH: &str = "/stats";

/// MJPEG streaming server
pub struct StreamServer<S: FrameSource + 'static> {
    config: ServerConfig,
    service: Arc<FanoutService<S, TcpTransport>>,
    request_semaphore: Option<Arc<Semaphore>>,
}

impl<S: FrameSource + 'static> StreamServer<S> {
    /// Create a new server with default registry and fanout configuration
    pub fn new(config: ServerConfig, source: S) -> Self {
        Self::with_configs(
            config,
            source,
            RegistryConfig::default(),
            FanoutConfig::default(),
        )
    }

    /// Create a new server with custom registry and fanout configuration
    pub fn with_configs(
        config: ServerConfig,
        source: S,
        registry_config: RegistryConfig,
        fanout_config: FanoutConfig,
    ) -> Self {
        let request_semaphore = if config.max_pending_requests > 0 {
            Some(Arc::new(Semaphore::new(config.max_pending_requests)))
        } else {
            None
        };

        Self {
            config,
            service: Arc::new(FanoutService::with_config(
                source,
                registry_config,
                fanout_config,
            )),
            request_semaphore,
        }
    }

    /// Get a reference to the fanout service
    pub fn service(&self) -> &Arc<FanoutService<S, TcpTransport>> {
        &self.service
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails to bind.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            capacity = self.service.capacity(),
            "MJPEG server listening"
        );

        let broadcast_handle = self.service.spawn_broadcast_task();
        let prune_handle = self.service.spawn_prune_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        // Stop periodic tasks on shutdown
        broadcast_handle.abort();
        prune_handle.abort();

        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check pending request limit
        let permit = if let Some(ref sem) = self.request_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: too many pending requests");
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let service = Arc::clone(&self.service);

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_request(service, config, socket, peer_addr).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Request failed");
            }
        });
    }
}

async fn handle_request<S: FrameSource + 'static>(
    service: Arc<FanoutService<S, TcpTransport>>,
    config: ServerConfig,
    mut stream: TcpStream,
    peer_addr: SocketAddr,
) -> Result<()> {
    let head = tokio::time::timeout(
        config.request_timeout,
        http::read_request_head(&mut stream, config.max_request_size),
    )
    .await??;

    tracing::debug!(
        peer = %peer_addr,
        method = ?head.method,
        path = %head.path,
        "Request"
    );

    let response = match (&head.method, head.path.as_str()) {
        (Method::Get, STREAM_PATH) => {
            let transport = TcpTransport::new(stream, peer_addr);
            return match admission::subscribe(&service, transport).await {
                Admission::Accepted(_) | Admission::Rejected(_) => Ok(()),
                Admission::Failed(e) => Err(e),
            };
        }
        (Method::Options, _) => admission::preflight(),
        (Method::Get, STATUS_PATH) => http::status_page(&service.stats().await),
        (Method::Get, STATS_PATH) => {
            let stats = service.stats().await;
            http::stats_page(&stats, &service.clients().await)
        }
        (Method::Get, _) => http::not_found(),
        _ => http::method_not_allowed(),
    };

    let write_timeout = service.fanout_config().write_timeout;
    tokio::time::timeout(write_timeout, stream.write_all(&response.encode())).await??;
    let _ = stream.shutdown().await;

    Ok(())
}
