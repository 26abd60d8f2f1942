//! Minimal HTTP/1.x request reading and response encoding
//!
//! Only what the stream endpoints need: read a request head, pull out the
//! method and path, and write small fixed responses. Request bodies are
//! never read.

use std::fmt::Write as _;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{HttpError, Result};
use crate::media::multipart::STREAM_CONTENT_TYPE;
use crate::registry::ClientSummary;
use crate::stats::StatsSnapshot;

/// End of a request head
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Headers attached to every response
const CORS_HEADERS: &str = "Access-Control-Allow-Origin: *\r\n\
                            Access-Control-Allow-Methods: GET\r\n\
                            Access-Control-Allow-Headers: Content-Type\r\n";

/// Request method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Options,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

/// Parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method
    pub method: Method,
    /// Path without query string
    pub path: String,
    /// Protocol version, e.g. `HTTP/1.1`
    pub version: String,
}

impl RequestHead {
    /// Parse a complete request head
    pub fn parse(head: &[u8]) -> std::result::Result<Self, HttpError> {
        let text = std::str::from_utf8(head)
            .map_err(|_| HttpError::Malformed("request head is not UTF-8".into()))?;

        let line = text
            .split("\r\n")
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| HttpError::Malformed("empty request line".into()))?;

        let mut parts = line.split_ascii_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(HttpError::Malformed(format!("bad request line: {:?}", line)));
        };

        if !version.starts_with("HTTP/1.") {
            return Err(HttpError::Malformed(format!("unsupported version {}", version)));
        }

        let path = target.split('?').next().unwrap_or(target).to_string();

        Ok(Self {
            method: Method::parse(method),
            path,
            version: version.to_string(),
        })
    }
}

/// Read a request head from `reader`
///
/// Reads until the blank line ending the headers. Fails with
/// `HttpError::TooLarge` once `max_size` bytes arrive without one.
pub async fn read_request_head<R>(reader: &mut R, max_size: usize) -> Result<RequestHead>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(max_size.min(1024));

    loop {
        if let Some(end) = find_terminator(&buf) {
            return Ok(RequestHead::parse(&buf[..end])?);
        }
        if buf.len() >= max_size {
            return Err(HttpError::TooLarge(max_size).into());
        }

        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(HttpError::Closed.into());
        }
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Response status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16, pub &'static str);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200, "OK");
    pub const NO_CONTENT: StatusCode = StatusCode(204, "No Content");
    pub const NOT_FOUND: StatusCode = StatusCode(404, "Not Found");
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405, "Method Not Allowed");
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503, "Service Unavailable");
}

/// A complete, non-streaming response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: Bytes,
}

impl Response {
    /// Response with a body
    pub fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            body: body.into(),
        }
    }

    /// Response without a body
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Serialize status line, headers and body
    pub fn encode(&self) -> Bytes {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status.0, self.status.1);
        if let Some(content_type) = self.content_type {
            let _ = write!(head, "Content-Type: {}\r\n", content_type);
        }
        if self.status != StatusCode::NO_CONTENT {
            let _ = write!(head, "Content-Length: {}\r\n", self.body.len());
        }
        head.push_str(CORS_HEADERS);
        head.push_str("Connection: close\r\n\r\n");

        let mut buf = BytesMut::with_capacity(head.len() + self.body.len());
        buf.put_slice(head.as_bytes());
        buf.put_slice(&self.body);
        buf.freeze()
    }
}

/// Header opening a multipart stream response
pub fn stream_response_header() -> Bytes {
    let head = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {}\r\n\
         {}\
         Cache-Control: no-cache, no-store, must-revalidate\r\n\
         Pragma: no-cache\r\n\
         \r\n",
        STREAM_CONTENT_TYPE, CORS_HEADERS
    );
    Bytes::from(head)
}

/// 503 sent when the registry is full
pub fn capacity_exceeded() -> Response {
    Response::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "text/plain",
        "Too many clients connected\r\n",
    )
}

/// 204 answer to a preflight request
pub fn preflight() -> Response {
    Response::empty(StatusCode::NO_CONTENT)
}

/// 404 for unknown paths
pub fn not_found() -> Response {
    Response::new(StatusCode::NOT_FOUND, "text/plain", "Not found\r\n")
}

/// 405 for unsupported methods
pub fn method_not_allowed() -> Response {
    Response::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "text/plain",
        "Method not allowed\r\n",
    )
}

/// HTML viewer page with the current occupancy
pub fn status_page(stats: &StatsSnapshot) -> Response {
    let html = format!(
        "<html><head><title>MJPEG Stream</title>\
         <style>\
         body {{ font-family: Arial, sans-serif; text-align: center; margin: 20px; }}\
         img {{ max-width: 100%; height: auto; border: 1px solid #ccc; }}\
         </style></head><body>\
         <h1>MJPEG Stream</h1>\
         <p>Clients: {} / {}</p>\
         <img src='/stream' onerror=\"this.src=''; this.alt='Stream Failed - Please Refresh'\"/>\
         </body></html>",
        stats.active_clients, stats.capacity
    );
    Response::new(StatusCode::OK, "text/html", html)
}

/// Plain-text stats and client listing
pub fn stats_page(stats: &StatsSnapshot, clients: &[ClientSummary]) -> Response {
    let mut body = String::new();
    let _ = writeln!(body, "{}", stats);
    let _ = writeln!(
        body,
        "frames: {}, uptime: {:.1}s, idle ticks: {}, capture failures: {}, write failures: {}",
        stats.frame_count,
        stats.elapsed.as_secs_f64(),
        stats.idle_ticks,
        stats.capture_failures,
        stats.write_failures
    );
    for client in clients {
        let _ = writeln!(
            body,
            "{} {} active={} frames={} bytes={} connected={:.1}s",
            client.id,
            client.peer,
            client.active,
            client.frames_sent,
            client.bytes_sent,
            client.connected_for.as_secs_f64()
        );
    }
    Response::new(StatusCode::OK, "text/plain", body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_request_line() {
        let head = RequestHead::parse(b"GET /stream?t=1 HTTP/1.1\r\nHost: cam\r\n").unwrap();
        assert_eq!(head.method, Method::Get);
        assert_eq!(head.path, "/stream");
        assert_eq!(head.version, "HTTP/1.1");

        let head = RequestHead::parse(b"PATCH / HTTP/1.0").unwrap();
        assert_eq!(head.method, Method::Other("PATCH".into()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RequestHead::parse(b"").is_err());
        assert!(RequestHead::parse(b"GET /").is_err());
        assert!(RequestHead::parse(b"GET / SPDY/3").is_err());
        assert!(RequestHead::parse(b"GET / HTTP/1.1 extra").is_err());
        assert!(RequestHead::parse(&[0xFF, 0xFE, 0x0D, 0x0A]).is_err());
    }

    #[tokio::test]
    async fn test_read_head_across_reads() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"OPTIONS /str")
            .read(b"eam HTTP/1.1\r\nOrigin: x\r\n")
            .read(b"\r\n")
            .build();

        let head = read_request_head(&mut reader, 8192).await.unwrap();
        assert_eq!(head.method, Method::Options);
        assert_eq!(head.path, "/stream");
    }

    #[tokio::test]
    async fn test_read_head_too_large() {
        let mut reader = tokio_test::io::Builder::new().read(&[b'a'; 64]).build();

        let result = read_request_head(&mut reader, 64).await;
        assert!(matches!(result, Err(Error::Http(HttpError::TooLarge(64)))));
    }

    #[tokio::test]
    async fn test_read_head_closed_early() {
        let mut reader = tokio_test::io::Builder::new().read(b"GET / HTTP/1.1\r\n").build();

        let result = read_request_head(&mut reader, 8192).await;
        assert!(matches!(result, Err(Error::Http(HttpError::Closed))));
    }

    #[test]
    fn test_stream_header() {
        let header = stream_response_header();
        let text = std::str::from_utf8(&header).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: multipart/x-mixed-replace; boundary=frame\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Access-Control-Allow-Methods: GET\r\n"));
        assert!(text.contains("Access-Control-Allow-Headers: Content-Type\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    fn test_capacity_exceeded_response() {
        let encoded = capacity_exceeded().encode();
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.ends_with("\r\n\r\nToo many clients connected\r\n"));
    }

    #[test]
    fn test_preflight_has_no_body() {
        let encoded = preflight().encode();
        let text = std::str::from_utf8(&encoded).unwrap();
        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(text.contains("Access-Control-Allow-Methods: GET\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_status_page_reports_occupancy() {
        let stats = StatsSnapshot {
            active_clients: 1,
            capacity: 4,
            frame_count: 0,
            elapsed: Duration::ZERO,
            frames_per_second: 0.0,
            last_frame_bytes: 0,
            idle_ticks: 0,
            capture_failures: 0,
            write_failures: 0,
        };
        let response = status_page(&stats);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert!(body.contains("Clients: 1 / 4"));
        assert!(body.contains("src='/stream'"));
    }
}
