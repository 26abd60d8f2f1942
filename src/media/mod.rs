//! Media framing for HTTP delivery
//!
//! This module provides:
//! - `multipart/x-mixed-replace` part framing for JPEG frames
//! - The response header that opens a multipart stream

pub mod multipart;

pub use multipart::{
    encode_part, part_header, write_part, BOUNDARY, PART_CONTENT_TYPE, PART_TRAILER,
    STREAM_CONTENT_TYPE,
};
