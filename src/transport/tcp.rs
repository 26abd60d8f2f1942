//! TCP subscriber transport

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::Transport;

/// Size of the scratch buffer used by the liveness probe
const PROBE_SIZE: usize = 64;

/// Subscriber connected over TCP
///
/// Liveness is checked with a non-blocking read: a zero-length read means
/// the peer closed its end. Anything the peer sends after the request head
/// is discarded.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer_addr: SocketAddr,
    failed: bool,
}

impl TcpTransport {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            failed: false,
        }
    }

    /// Remote address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl Transport for TcpTransport {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if let Err(e) = self.stream.write_all(buf).await {
            self.failed = true;
            return Err(e);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if self.failed {
            return false;
        }

        let mut probe = [0u8; PROBE_SIZE];
        match self.stream.try_read(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        }
    }

    fn peer(&self) -> String {
        self.peer_addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    async fn connected_pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (TcpTransport::new(server, peer), client)
    }

    #[tokio::test]
    async fn test_write_reaches_peer() {
        let (mut transport, mut client) = connected_pair().await;

        transport.write_all(b"hello").await.unwrap();

        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn test_detects_peer_close() {
        let (transport, client) = connected_pair().await;
        assert!(transport.is_connected());

        drop(client);

        // Allow the FIN to arrive
        let mut closed = false;
        for _ in 0..50 {
            if !transport.is_connected() {
                closed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(closed);
    }
}
