//! Subscriber admission
//!
//! Decides whether a subscribe request gets a stream. The capacity check,
//! the stream header write and the registry insert all happen under the
//! service lock, so two concurrent subscribers cannot both take the last
//! slot.

use crate::error::Error;
use crate::fanout::FanoutService;
use crate::frame::FrameSource;
use crate::registry::{ClientId, RegistryError};
use crate::transport::Transport;

use super::http;

/// Result of a subscribe request
#[derive(Debug)]
pub enum Admission {
    /// Stream header sent and client registered
    Accepted(ClientId),
    /// Registry full; a 503 was sent (best effort)
    Rejected(RegistryError),
    /// The peer failed before it could be registered
    Failed(Error),
}

/// Handle a subscribe request on `transport`
pub async fn subscribe<S, T>(service: &FanoutService<S, T>, mut transport: T) -> Admission
where
    S: FrameSource + 'static,
    T: Transport + 'static,
{
    let write_timeout = service.fanout_config().write_timeout;
    let mut core = service.lock().await;

    if core.registry.is_full() {
        let capacity = core.registry.capacity();
        drop(core);

        tracing::warn!(
            peer = %transport.peer(),
            capacity = capacity,
            "Subscriber rejected: capacity exceeded"
        );

        let response = http::capacity_exceeded().encode();
        match tokio::time::timeout(write_timeout, transport.write_all(&response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(
                    peer = %transport.peer(),
                    error = %e,
                    "Rejection response failed"
                );
            }
            Err(_) => {
                tracing::debug!(peer = %transport.peer(), "Rejection response timed out");
            }
        }
        return Admission::Rejected(RegistryError::CapacityExceeded { capacity });
    }

    let header = http::stream_response_header();
    match tokio::time::timeout(write_timeout, transport.write_all(&header)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Admission::Failed(Error::Io(e)),
        Err(_) => return Admission::Failed(Error::Timeout),
    }

    match core.registry.admit(transport) {
        Ok(id) => Admission::Accepted(id),
        Err(rejected) => Admission::Rejected(rejected.error),
    }
}

/// Answer a preflight request without touching the registry
pub fn preflight() -> http::Response {
    http::preflight()
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::frame::StillSource;
    use crate::registry::RegistryConfig;
    use crate::fanout::FanoutConfig;
    use crate::transport::MemoryTransport;

    fn service(max: usize) -> FanoutService<StillSource, MemoryTransport> {
        let source = StillSource::new(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9])).unwrap();
        FanoutService::with_config(
            source,
            RegistryConfig::default().max_clients(max),
            FanoutConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_accept_writes_stream_header() {
        let service = service(1);
        let (transport, handle) = MemoryTransport::new("a");

        let admission = subscribe(&service, transport).await;
        assert!(matches!(admission, Admission::Accepted(_)));
        assert_eq!(handle.written(), http::stream_response_header().to_vec());
        assert_eq!(service.lock().await.registry.len(), 1);
    }

    #[tokio::test]
    async fn test_reject_when_full() {
        let service = service(1);
        let (a, _) = MemoryTransport::new("a");
        let (b, handle_b) = MemoryTransport::new("b");

        subscribe(&service, a).await;
        let admission = subscribe(&service, b).await;

        assert!(matches!(
            admission,
            Admission::Rejected(RegistryError::CapacityExceeded { capacity: 1 })
        ));
        assert_eq!(handle_b.written(), http::capacity_exceeded().encode().to_vec());
        assert_eq!(service.lock().await.registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_survives_bad_peer() {
        let service = service(1);
        let (a, _) = MemoryTransport::new("a");
        subscribe(&service, a).await;

        let (broken, handle) = MemoryTransport::new("broken");
        handle.fail_writes(true);
        let admission = subscribe(&service, broken).await;
        assert!(matches!(admission, Admission::Rejected(_)));

        let (stuck, handle) = MemoryTransport::new("stuck");
        handle.stall_writes(true);
        let admission = subscribe(&service, stuck).await;
        assert!(matches!(admission, Admission::Rejected(_)));
        assert!(handle.written().is_empty());
        assert_eq!(service.lock().await.registry.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_header_write_not_registered() {
        let service = service(2);
        let (transport, handle) = MemoryTransport::new("a");
        handle.fail_writes(true);

        let admission = subscribe(&service, transport).await;
        assert!(matches!(admission, Admission::Failed(Error::Io(_))));
        assert!(service.lock().await.registry.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_leaves_registry_alone() {
        let service = service(2);
        let response = preflight();
        assert_eq!(response.status, http::StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());
        assert!(service.lock().await.registry.is_empty());
    }
}
