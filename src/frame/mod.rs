//! Frame acquisition
//!
//! A [`FrameSource`] hands out one encoded JPEG frame at a time. The frame is
//! owned by the source between `acquire` and `release`; the fanout loop only
//! ever reads it through a [`FrameLease`], which pairs every successful
//! acquisition with exactly one release.
//!
//! ```text
//!   FrameSource::acquire ──► FrameLease ──► &[u8] to every client ──► drop
//!                                                                      │
//!   FrameSource::release ◄─────────────────────────────────────────────┘
//! ```

pub mod directory;
pub mod lease;
pub mod pool;
pub mod still;

use std::fmt;
use std::time::Instant;

use bytes::Bytes;

pub use directory::DirectorySource;
pub use lease::FrameLease;
pub use pool::BufferPool;
pub use still::StillSource;

/// JPEG start-of-image marker
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// One encoded image produced for a single broadcast tick
///
/// Cheap to clone: the payload is reference counted and never mutated.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded JPEG bytes
    pub data: Bytes,
    /// Per-source sequence number, starting at 1
    pub sequence: u64,
    /// When the source produced this frame
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame captured now
    pub fn new(data: Bytes, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Why a capture attempt produced no frame
///
/// All variants are transient: the tick is skipped and the next one retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device has no frame ready yet
    NotReady,
    /// Every frame buffer is still checked out
    PoolExhausted,
    /// The device reported a hardware failure
    Device(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NotReady => write!(f, "no frame ready"),
            CaptureError::PoolExhausted => write!(f, "frame buffer pool exhausted"),
            CaptureError::Device(reason) => write!(f, "device failure: {}", reason),
        }
    }
}

impl std::error::Error for CaptureError {}

/// A producer of encoded frames
///
/// `release` must be called exactly once for every frame returned by
/// `acquire`. Use [`FrameLease`] rather than calling the pair by hand.
pub trait FrameSource: Send {
    /// Take the next available frame
    fn acquire(&mut self) -> Result<Frame, CaptureError>;

    /// Give a frame back to the source
    fn release(&mut self, frame: Frame);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire(&mut self) -> Result<Frame, CaptureError> {
        (**self).acquire()
    }

    fn release(&mut self, frame: Frame) {
        (**self).release(frame)
    }
}

/// Check for the JPEG start-of-image marker
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&JPEG_SOI)
}
