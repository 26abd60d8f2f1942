//! Multipart JPEG stream framing
//!
//! A multipart stream is one long HTTP response whose body is a sequence of
//! parts separated by a boundary line. Browsers replace the displayed image
//! with each new part as it arrives.
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <JPEG bytes>\r\n
//! --frame\r\n
//! ...
//! ```

use std::io;

use bytes::{BufMut, Bytes, BytesMut};

use crate::transport::Transport;

/// Boundary token separating parts
pub const BOUNDARY: &str = "frame";

/// Content type of the streaming response
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Content type of each part
pub const PART_CONTENT_TYPE: &str = "image/jpeg";

/// Bytes following each part body
pub const PART_TRAILER: &[u8] = b"\r\n";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Header preceding every part body
pub fn part_header() -> &'static [u8] {
    PART_HEADER
}

/// Encode one complete part into a single buffer
pub fn encode_part(jpeg: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(PART_HEADER.len() + jpeg.len() + PART_TRAILER.len());
    buf.put_slice(PART_HEADER);
    buf.put_slice(jpeg);
    buf.put_slice(PART_TRAILER);
    buf.freeze()
}

/// Write one part straight from the shared frame buffer
///
/// The frame is copied out into the transport; nothing retains a reference
/// past this call.
pub async fn write_part<T: Transport>(transport: &mut T, jpeg: &[u8]) -> io::Result<()> {
    transport.write_all(PART_HEADER).await?;
    transport.write_all(jpeg).await?;
    transport.write_all(PART_TRAILER).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_header_uses_boundary() {
        let header = std::str::from_utf8(part_header()).unwrap();
        assert!(header.starts_with(&format!("--{}\r\n", BOUNDARY)));
        assert!(header.contains(PART_CONTENT_TYPE));
        assert!(STREAM_CONTENT_TYPE.ends_with(&format!("boundary={}", BOUNDARY)));
    }

    #[test]
    fn test_encode_part() {
        let part = encode_part(&[0xFF, 0xD8, 0xFF, 0xD9]);

        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(&part[..], &expected[..]);
    }

    #[tokio::test]
    async fn test_write_part_matches_encode() {
        let (mut transport, handle) = MemoryTransport::new("t");
        let jpeg = vec![0xAB; 100];

        write_part(&mut transport, &jpeg).await.unwrap();

        assert_eq!(handle.written(), encode_part(&jpeg).to_vec());
        assert_eq!(handle.write_count(), 3);
    }
}
