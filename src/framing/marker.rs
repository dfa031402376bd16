//! JPEG marker-scanning reassembly
//!
//! Reassembles frames from a raw concatenated-JPEG stream (e.g. the stdout of
//! `rpicam-vid --codec mjpeg -o -`) by scanning for the start-of-image and
//! end-of-image markers. The stream carries no alignment guarantees: a marker
//! may arrive split across two reads, and a single read may carry several
//! complete frames.

use bytes::{Buf, BytesMut};

use super::{Frame, FrameScanner};

/// JPEG start-of-image marker
const SOI: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Incremental SOI/EOI marker scanner
#[derive(Debug, Default)]
pub struct MarkerScanner {
    buf: BytesMut,
}

impl MarkerScanner {
    /// Create an empty scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently buffered (incomplete frame data)
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl FrameScanner for MarkerScanner {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_frame(&mut self) -> Option<Frame> {
        match find_marker(&self.buf, &SOI) {
            Some(start) => {
                // Bytes before the start marker are framing noise, not part
                // of any frame.
                if start > 0 {
                    self.buf.advance(start);
                }

                // The end marker can only begin after the start marker.
                let end = find_marker(&self.buf[SOI.len()..], &EOI)? + SOI.len();
                let frame = self.buf.split_to(end + EOI.len()).freeze();
                Some(Frame::new(frame))
            }
            None => {
                // No start marker anywhere in the buffer: discard the noise,
                // keeping a trailing 0xFF that may be half of a split marker.
                let keep = usize::from(self.buf.last() == Some(&0xFF));
                let drop = self.buf.len() - keep;
                if drop > 0 {
                    self.buf.advance(drop);
                }
                None
            }
        }
    }
}

fn find_marker(haystack: &[u8], marker: &[u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|w| w == marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a well-formed frame of exactly `len` bytes (markers included)
    fn jpeg_frame(len: usize) -> Vec<u8> {
        assert!(len >= 4);
        let mut frame = Vec::with_capacity(len);
        frame.extend_from_slice(&SOI);
        frame.resize(len - 2, 0x42);
        frame.extend_from_slice(&EOI);
        frame
    }

    fn drain(scanner: &mut MarkerScanner) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = scanner.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame_exact_bytes() {
        let mut scanner = MarkerScanner::new();
        let frame = jpeg_frame(64);

        scanner.push(&frame);
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), frame.as_slice());
    }

    #[test]
    fn test_noise_before_start_marker_discarded() {
        let mut scanner = MarkerScanner::new();
        let frame = jpeg_frame(32);

        scanner.push(&[0x00, 0x11, 0x22, 0xD9, 0xFF]);
        assert!(scanner.next_frame().is_none());
        scanner.push(&frame);

        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), frame.as_slice());
    }

    #[test]
    fn test_three_frames_in_one_chunk() {
        let mut scanner = MarkerScanner::new();
        let mut chunk = Vec::new();
        for _ in 0..3 {
            chunk.extend_from_slice(&jpeg_frame(1000));
        }

        scanner.push(&chunk);
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 3);
        for frame in &out {
            assert_eq!(frame.len(), 1000);
        }
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut scanner = MarkerScanner::new();
        let frame = jpeg_frame(100);

        // Split inside the start marker and inside the end marker.
        scanner.push(&frame[..1]);
        assert!(scanner.next_frame().is_none());
        scanner.push(&frame[1..99]);
        assert!(scanner.next_frame().is_none());
        scanner.push(&frame[99..]);

        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), frame.as_slice());
    }

    #[test]
    fn test_partial_frame_never_surfaced() {
        let mut scanner = MarkerScanner::new();

        scanner.push(&[0xFF, 0xD8, 0x01, 0x02, 0x03]);
        assert!(scanner.next_frame().is_none());
        assert!(scanner.buffered() > 0);
    }

    #[test]
    fn test_end_marker_without_start_discarded() {
        let mut scanner = MarkerScanner::new();

        scanner.push(&[0x00, 0xFF, 0xD9, 0x00]);
        assert!(scanner.next_frame().is_none());
        // Buffer was recognized as noise and dropped.
        assert_eq!(scanner.buffered(), 0);

        let frame = jpeg_frame(16);
        scanner.push(&frame);
        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), frame.as_slice());
    }

    #[test]
    fn test_minimal_frame() {
        let mut scanner = MarkerScanner::new();

        scanner.push(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
    }
}
