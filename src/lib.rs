//! MJPEG camera capture and live streaming library
//!
//! This crate supervises an external MJPEG capture process (such as
//! `rpicam-vid` or `ffmpeg`), reassembles complete JPEG frames from its raw
//! byte stream, and fans those frames out to any number of connected viewers
//! with best-effort live-stream delivery.
//!
//! # Architecture
//!
//! ```text
//!   capture process stdout
//!            │
//!            ▼
//!     [Reader task] ──── FrameScanner (markers or multipart)
//!            │
//!            ▼
//!    bounded frame channel (drop-on-full)
//!            │
//!            ▼
//!   [Broadcaster task] ──► SubscriberSet ──► per-viewer queues ──► transport
//!                               ▲
//!         attach()/detach() ────┘        [Idle reaper task]
//!                                        stops capture after the
//!                                        set stays empty past the
//!                                        grace window
//! ```
//!
//! # Backpressure
//!
//! Every viewer owns an independent bounded queue. A frame that does not fit
//! in a viewer's queue is dropped for that viewer only; a slow viewer sees
//! stutter, never stalls the capture pipeline or other viewers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mjpeg_rs::{CameraSession, CaptureConfig};
//!
//! # async fn run() -> mjpeg_rs::Result<()> {
//! let session = Arc::new(CameraSession::new(CaptureConfig::default()));
//!
//! // Attaching lazily starts the capture process.
//! let mut viewer = session.attach()?;
//! while let Some(frame) = viewer.recv().await {
//!     // hand the frame to the transport layer
//!     println!("frame: {} bytes", frame.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod device;
pub mod error;
pub mod framing;
pub mod registry;
pub mod stats;
pub mod transport;

pub use capture::backend::{CaptureBackend, CaptureControl, CaptureHandle, RpicamBackend, V4l2Backend};
pub use capture::config::CaptureConfig;
pub use capture::session::CameraSession;
pub use device::{IndicatorLight, NoLight};
pub use error::{CaptureError, Result};
pub use framing::{Frame, FramingMode};
pub use registry::{Subscription, ViewerId};
pub use stats::StatsSnapshot;
