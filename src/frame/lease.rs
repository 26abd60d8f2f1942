//! Scoped frame ownership
//!
//! A `FrameLease` borrows the source mutably for as long as the frame is
//! out, so a second `acquire` cannot happen while one frame is outstanding,
//! and the frame goes back on drop even if the tick bails out or its future
//! is cancelled mid-broadcast.

use std::mem;
use std::ops::Deref;

use bytes::Bytes;

use super::{CaptureError, Frame, FrameSource};

/// A frame checked out of a [`FrameSource`] for one tick
pub struct FrameLease<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    frame: Frame,
}

impl<'a, S: FrameSource + ?Sized> FrameLease<'a, S> {
    /// Acquire a frame from `source`
    pub fn acquire(source: &'a mut S) -> Result<Self, CaptureError> {
        let frame = source.acquire()?;
        Ok(Self { source, frame })
    }

    /// The leased frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl<S: FrameSource + ?Sized> Deref for FrameLease<'_, S> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.frame().as_bytes()
    }
}

impl<S: FrameSource + ?Sized> Drop for FrameLease<'_, S> {
    fn drop(&mut self) {
        // Hand back the acquired frame itself; the lease keeps no reference
        let placeholder = Frame::new(Bytes::new(), self.frame.sequence);
        let frame = mem::replace(&mut self.frame, placeholder);
        self.source.release(frame);
    }
}
