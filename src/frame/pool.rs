//! Frame buffer pool accounting
//!
//! Camera drivers allocate a fixed number of frame buffers up front and hand
//! them out one per capture. If buffers are never returned the driver stalls,
//! so sources track how many are checked out and refuse to capture once the
//! pool is empty.

use super::CaptureError;

/// Default number of frame buffers, matching a typical two-buffer camera setup
pub const DEFAULT_FB_COUNT: usize = 2;

/// Fixed-size pool of frame buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    capacity: usize,
    outstanding: usize,
}

impl BufferPool {
    /// Create a pool with `capacity` buffers (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            outstanding: 0,
        }
    }

    /// Take a buffer out of the pool
    pub fn checkout(&mut self) -> Result<(), CaptureError> {
        if self.outstanding >= self.capacity {
            return Err(CaptureError::PoolExhausted);
        }
        self.outstanding += 1;
        Ok(())
    }

    /// Return a buffer to the pool
    pub fn checkin(&mut self) {
        if self.outstanding == 0 {
            tracing::warn!("Frame returned to a pool with no outstanding buffers");
            return;
        }
        self.outstanding -= 1;
    }

    /// Number of buffers currently checked out
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Total number of buffers
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_FB_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_until_exhausted() {
        let mut pool = BufferPool::new(2);

        pool.checkout().unwrap();
        pool.checkout().unwrap();
        assert_eq!(pool.outstanding(), 2);
        assert_eq!(pool.checkout(), Err(CaptureError::PoolExhausted));

        pool.checkin();
        assert!(pool.checkout().is_ok());
    }

    #[test]
    fn test_checkin_underflow_is_ignored() {
        let mut pool = BufferPool::default();
        pool.checkin();
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.capacity(), DEFAULT_FB_COUNT);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let pool = BufferPool::new(0);
        assert_eq!(pool.capacity(), 1);
    }
}
