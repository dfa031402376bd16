//! Error types
//!
//! The only fallible public operations are starting a capture session and
//! attaching a viewer (which may lazily start one). Stream-read failures and
//! malformed framing are handled inside the pipeline and never surfaced as
//! error values.

use std::io;

/// Result alias for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Error starting a capture session
#[derive(Debug)]
pub enum CaptureError {
    /// The capture process could not be spawned
    Spawn(io::Error),
    /// The capture process has no readable output pipe
    OutputUnavailable,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Spawn(e) => write!(f, "Failed to spawn capture process: {}", e),
            CaptureError::OutputUnavailable => {
                write!(f, "Capture process has no readable output pipe")
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Spawn(e) => Some(e),
            CaptureError::OutputUnavailable => None,
        }
    }
}

impl From<io::Error> for CaptureError {
    fn from(e: io::Error) -> Self {
        CaptureError::Spawn(e)
    }
}
