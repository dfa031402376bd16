//! Frame reassembly from the raw capture byte stream
//!
//! The capture process writes an unbounded byte stream with no alignment
//! guarantees: a single read may carry several frames, and a frame, header,
//! or even a two-byte marker may be split across reads. The scanners in this
//! module accumulate bytes and surface only fully assembled frames.
//!
//! Two framing strategies are supported; a deployment picks one to match its
//! capture tool:
//!
//! - [`MarkerScanner`] for raw concatenated JPEG output
//!   (`rpicam-vid --codec mjpeg`)
//! - [`MultipartScanner`] for multipart output with Content-Length headers
//!   (`ffmpeg -f mpjpeg`)

pub mod frame;
pub mod marker;
pub mod multipart;

pub use frame::Frame;
pub use marker::MarkerScanner;
pub use multipart::MultipartScanner;

/// Incremental frame reassembly over an arbitrarily-chunked byte stream
pub trait FrameScanner: Send {
    /// Feed a chunk of raw bytes into the scanner
    fn push(&mut self, chunk: &[u8]);

    /// Take the next fully assembled frame, if one is available
    ///
    /// Call repeatedly until it returns `None`: a single pushed chunk may
    /// complete several frames.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Framing strategy used to reassemble frames from the capture stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// Scan for JPEG start/end-of-image markers
    #[default]
    Markers,
    /// Parse multipart header blocks with Content-Length
    Multipart,
}

impl FramingMode {
    /// Create a fresh scanner for this framing mode
    pub fn scanner(&self) -> Box<dyn FrameScanner> {
        match self {
            FramingMode::Markers => Box::new(MarkerScanner::new()),
            FramingMode::Multipart => Box::new(MultipartScanner::new()),
        }
    }
}
