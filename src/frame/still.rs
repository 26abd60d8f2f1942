//! Single-image frame source

use bytes::Bytes;

use super::pool::BufferPool;
use super::{is_jpeg, CaptureError, Frame, FrameSource};
use crate::error::{Error, Result};

/// Serves the same JPEG image on every tick
///
/// Useful for test patterns and for devices that publish a snapshot.
#[derive(Debug)]
pub struct StillSource {
    image: Bytes,
    pool: BufferPool,
    sequence: u64,
}

impl StillSource {
    /// Create a source from an encoded JPEG
    pub fn new(image: impl Into<Bytes>) -> Result<Self> {
        let image = image.into();
        if !is_jpeg(&image) {
            return Err(Error::CameraInit("image is not a JPEG".into()));
        }

        Ok(Self {
            image,
            pool: BufferPool::default(),
            sequence: 0,
        })
    }

    /// Number of frames handed out so far
    pub fn frames_captured(&self) -> u64 {
        self.sequence
    }
}

impl FrameSource for StillSource {
    fn acquire(&mut self) -> std::result::Result<Frame, CaptureError> {
        self.pool.checkout()?;
        self.sequence += 1;
        Ok(Frame::new(self.image.clone(), self.sequence))
    }

    fn release(&mut self, _frame: Frame) {
        self.pool.checkin();
    }
}
