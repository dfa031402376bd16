//! Capture supervision
//!
//! Owns the external capture subprocess's lifecycle: spawn with the
//! configured resolution/framerate/quality, read its output pipe, terminate
//! it on stop, and keep start/stop exactly-once under concurrent callers.

pub mod backend;
pub mod config;
pub mod session;

pub use backend::{CaptureBackend, CaptureControl, CaptureHandle, CaptureOutput, RpicamBackend, V4l2Backend};
pub use config::CaptureConfig;
pub use session::CameraSession;
