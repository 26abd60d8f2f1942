//! Directory-backed frame source
//!
//! Loads every `.jpg`/`.jpeg` file from a directory at startup and cycles
//! through them in file-name order. Stands in for a camera driver on hosts
//! without capture hardware.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::pool::BufferPool;
use super::{is_jpeg, CaptureError, Frame, FrameSource};
use crate::error::{Error, Result};

/// Frame source that replays JPEG files from disk
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    images: Vec<Bytes>,
    next: usize,
    pool: BufferPool,
    sequence: u64,
}

impl DirectorySource {
    /// Load all JPEG files from `dir`
    ///
    /// Fails with [`Error::CameraInit`] when the directory cannot be read,
    /// holds no JPEG files, or one of them lacks a JPEG header.
    pub fn open(dir: impl AsRef<Path>, fb_count: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let entries = fs::read_dir(&dir)
            .map_err(|e| Error::CameraInit(format!("cannot read {}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_jpeg_extension(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(Error::CameraInit(format!(
                "no JPEG files in {}",
                dir.display()
            )));
        }

        let mut images = Vec::with_capacity(paths.len());
        for path in &paths {
            let data = fs::read(path).map_err(|e| {
                Error::CameraInit(format!("cannot read {}: {}", path.display(), e))
            })?;
            if !is_jpeg(&data) {
                return Err(Error::CameraInit(format!(
                    "{} is not a JPEG image",
                    path.display()
                )));
            }
            images.push(Bytes::from(data));
        }

        tracing::info!(
            dir = %dir.display(),
            frames = images.len(),
            fb_count = fb_count,
            "Frame source ready"
        );

        Ok(Self {
            dir,
            images,
            next: 0,
            pool: BufferPool::new(fb_count),
            sequence: 0,
        })
    }

    /// Number of distinct images loaded
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Directory the images were loaded from
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSource for DirectorySource {
    fn acquire(&mut self) -> std::result::Result<Frame, CaptureError> {
        self.pool.checkout()?;

        let data = self.images[self.next].clone();
        self.next = (self.next + 1) % self.images.len();
        self.sequence += 1;

        Ok(Frame::new(data, self.sequence))
    }

    fn release(&mut self, _frame: Frame) {
        self.pool.checkin();
    }
}

fn has_jpeg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}
