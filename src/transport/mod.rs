//! Outbound multipart encoding
//!
//! Viewer transports deliver frames as a `multipart/x-mixed-replace` stream:
//! each part carries a boundary marker, a Content-Type header, and a
//! Content-Length matching the exact frame byte count. Helpers here build
//! that wrapping; the frame boundaries themselves come exact from the
//! reassembly pipeline.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::framing::Frame;

/// Default part boundary
pub const BOUNDARY: &str = "frame";

/// Content type for the enclosing response
pub fn content_type(boundary: &str) -> String {
    format!("multipart/x-mixed-replace; boundary={}", boundary)
}

/// Build the header preceding one frame's bytes
pub fn part_header(boundary: &str, frame_len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(96);
    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"\r\nContent-Type: image/jpeg\r\nContent-Length: ");
    buf.put_slice(frame_len.to_string().as_bytes());
    buf.put_slice(b"\r\n\r\n");
    buf.freeze()
}

/// Write one frame as a complete multipart part and flush
pub async fn write_part<W>(writer: &mut W, boundary: &str, frame: &Frame) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&part_header(boundary, frame.len())).await?;
    writer.write_all(frame.as_ref()).await?;
    writer.flush().await
}
