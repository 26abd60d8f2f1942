//! Error types
//!
//! Errors are contained at the smallest scope they affect: a failed client
//! write only touches that client's registry entry, a failed capture only
//! skips the current tick. Only startup failures (`CameraInit`, binding the
//! listener) reach the caller of `StreamServer::run`.

use std::fmt;
use std::io;

use crate::frame::CaptureError;
use crate::registry::RegistryError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket or filesystem I/O failure
    Io(io::Error),
    /// The frame source could not be brought up; the server must not start
    CameraInit(String),
    /// A frame could not be captured
    Capture(CaptureError),
    /// Registry operation refused
    Registry(RegistryError),
    /// Malformed or oversized HTTP request
    Http(HttpError),
    /// An operation did not complete within its deadline
    Timeout,
}

/// HTTP request errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Request line or headers could not be parsed
    Malformed(String),
    /// Request head exceeded the configured limit
    TooLarge(usize),
    /// Peer closed the connection before sending a full request head
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::CameraInit(reason) => write!(f, "Camera init failed: {}", reason),
            Error::Capture(e) => write!(f, "Capture error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Timeout => write!(f, "Operation timed out"),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Malformed(reason) => write!(f, "malformed request: {}", reason),
            HttpError::TooLarge(limit) => write!(f, "request head exceeds {} bytes", limit),
            HttpError::Closed => write!(f, "connection closed before request completed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Capture(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for HttpError {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Error::Capture(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Self {
        Error::Http(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}
