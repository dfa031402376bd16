//! Header-delimited (multipart) reassembly
//!
//! Reassembles frames from an MJPEG multipart stream (e.g. the stdout of
//! `ffmpeg -f mpjpeg`). Each part is a header block terminated by a blank
//! line; a Content-Type line signals a new frame and a Content-Length line
//! declares the exact body size. Header blocks and bodies may arrive split at
//! arbitrary points across reads.
//!
//! Malformed blocks (missing Content-Type or Content-Length, unparsable
//! length, runaway header) are logged and dropped; scanning resumes at the
//! next block.

use bytes::BytesMut;

use super::{Frame, FrameScanner};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Give up on a header block that grows past this without a terminator.
const MAX_HEADER_SCAN: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for a header block terminator
    Header,
    /// Accumulating a body of known length
    Body { need: usize },
}

/// Incremental multipart frame scanner
#[derive(Debug)]
pub struct MultipartScanner {
    buf: BytesMut,
    state: ScanState,
}

impl MultipartScanner {
    /// Create an empty scanner
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            state: ScanState::Header,
        }
    }

    /// Bytes currently buffered (incomplete header or body data)
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl Default for MultipartScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner for MultipartScanner {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                ScanState::Header => {
                    let Some(pos) = find_subslice(&self.buf, HEADER_TERMINATOR) else {
                        if self.buf.len() > MAX_HEADER_SCAN {
                            tracing::warn!(
                                buffered = self.buf.len(),
                                "Malformed part: no header terminator, resynchronizing"
                            );
                            self.buf.clear();
                        }
                        return None;
                    };

                    let block = self.buf.split_to(pos + HEADER_TERMINATOR.len());
                    if let Some(len) = parse_part_header(&block[..pos]) {
                        self.state = ScanState::Body { need: len };
                    }
                }
                ScanState::Body { need } => {
                    if self.buf.len() < need {
                        return None;
                    }
                    let body = self.buf.split_to(need).freeze();
                    self.state = ScanState::Header;
                    return Some(Frame::new(body));
                }
            }
        }
    }
}

/// Parse one header block, returning the declared body length.
///
/// A block without a Content-Type line is not a frame header (boundary
/// preamble, stray data) and is skipped silently at debug level; a frame
/// header with a missing or unparsable Content-Length is a malformation.
fn parse_part_header(block: &[u8]) -> Option<usize> {
    if find_subslice_ci(block, b"content-type").is_none() {
        tracing::debug!(len = block.len(), "Skipping part block without Content-Type");
        return None;
    }

    let Some(at) = find_subslice_ci(block, b"content-length") else {
        tracing::warn!("Malformed part: missing Content-Length");
        return None;
    };

    match parse_length_value(&block[at + b"content-length".len()..]) {
        Some(len) => Some(len),
        None => {
            tracing::warn!("Malformed part: invalid Content-Length");
            None
        }
    }
}

/// Parse `: <digits>` after the Content-Length header name.
fn parse_length_value(rest: &[u8]) -> Option<usize> {
    let mut i = 0;
    while rest.get(i) == Some(&b' ') || rest.get(i) == Some(&b'\t') {
        i += 1;
    }
    if rest.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    while rest.get(i) == Some(&b' ') || rest.get(i) == Some(&b'\t') {
        i += 1;
    }

    let start = i;
    while rest.get(i).is_some_and(|b| b.is_ascii_digit()) {
        i += 1;
    }
    if i == start {
        return None;
    }
    std::str::from_utf8(&rest[start..i]).ok()?.parse().ok()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_subslice_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"--FRAME\r\n");
        out.extend_from_slice(b"Content-Type: image/jpeg\r\n");
        out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn drain(scanner: &mut MultipartScanner) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = scanner.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_part() {
        let mut scanner = MultipartScanner::new();
        let body = vec![0xAB; 500];

        scanner.push(&part(&body));
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), body.as_slice());
    }

    #[test]
    fn test_part_split_mid_header_and_mid_body() {
        let mut scanner = MultipartScanner::new();
        let body = vec![0xCD; 300];
        let bytes = part(&body);

        // Split in the middle of the Content-Length line, then mid-body.
        scanner.push(&bytes[..30]);
        assert!(scanner.next_frame().is_none());
        scanner.push(&bytes[30..100]);
        assert!(scanner.next_frame().is_none());
        scanner.push(&bytes[100..]);

        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), body.as_slice());
    }

    #[test]
    fn test_back_to_back_parts_exact_sizes_in_order() {
        let mut scanner = MultipartScanner::new();
        let mut chunk = Vec::new();
        for fill in [0x01u8, 0x02, 0x03] {
            chunk.extend_from_slice(&part(&vec![fill; 1000]));
        }

        scanner.push(&chunk);
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 3);
        for (i, fill) in [0x01u8, 0x02, 0x03].iter().enumerate() {
            assert_eq!(out[i].len(), 1000);
            assert!(out[i].as_ref().iter().all(|b| b == fill));
        }
    }

    #[test]
    fn test_missing_content_length_skipped() {
        let mut scanner = MultipartScanner::new();
        let body = vec![0xEE; 100];

        scanner.push(b"--FRAME\r\nContent-Type: image/jpeg\r\n\r\n");
        assert!(scanner.next_frame().is_none());

        // Parser resynchronizes on the next well-formed part.
        scanner.push(&part(&body));
        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), body.as_slice());
    }

    #[test]
    fn test_unparsable_content_length_skipped() {
        let mut scanner = MultipartScanner::new();

        scanner.push(b"--FRAME\r\nContent-Type: image/jpeg\r\nContent-Length: abc\r\n\r\n");
        assert!(scanner.next_frame().is_none());

        let body = vec![0x77; 50];
        scanner.push(&part(&body));
        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_body_not_overread() {
        let mut scanner = MultipartScanner::new();
        let body = vec![0x55; 200];
        let mut bytes = part(&body);
        bytes.extend_from_slice(b"--FRAME\r\nContent-Type");

        scanner.push(&bytes);
        let out = drain(&mut scanner);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 200);
        // The start of the next part stays buffered.
        assert!(scanner.buffered() > 0);
    }

    #[test]
    fn test_lowercase_headers_accepted() {
        let mut scanner = MultipartScanner::new();
        let body = vec![0x10; 40];

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"--frame\r\ncontent-type: image/jpeg\r\ncontent-length: 40\r\n\r\n");
        bytes.extend_from_slice(&body);

        scanner.push(&bytes);
        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), body.as_slice());
    }

    #[test]
    fn test_runaway_header_resynchronizes() {
        let mut scanner = MultipartScanner::new();

        // A long stretch with no terminator at all.
        scanner.push(&vec![b'x'; MAX_HEADER_SCAN + 1]);
        assert!(scanner.next_frame().is_none());
        assert_eq!(scanner.buffered(), 0);

        let body = vec![0x99; 60];
        scanner.push(&part(&body));
        let out = drain(&mut scanner);
        assert_eq!(out.len(), 1);
    }
}
