//! Capture process backends
//!
//! Subprocess lifecycle (spawn, read pipe, forced kill) sits behind a small
//! capability interface so alternate camera drivers are swappable without
//! touching frame reassembly or fan-out. Two backends are provided:
//!
//! - [`RpicamBackend`]: `rpicam-vid` on Raspberry Pi camera modules; emits a
//!   raw concatenated JPEG stream, pair with [`FramingMode::Markers`].
//! - [`V4l2Backend`]: `ffmpeg` reading a V4L2 device (USB webcams); emits an
//!   mpjpeg multipart stream, pair with [`FramingMode::Multipart`].
//!
//! [`FramingMode::Markers`]: crate::framing::FramingMode::Markers
//! [`FramingMode::Multipart`]: crate::framing::FramingMode::Multipart

use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use super::config::CaptureConfig;
use crate::error::{CaptureError, Result};

/// Readable output handle of a running capture process
pub type CaptureOutput = Box<dyn AsyncRead + Send + Unpin>;

/// Kill switch for a running capture process
pub trait CaptureControl: Send {
    /// Forcibly terminate the process
    ///
    /// Must be safe to call after the process has already exited.
    fn terminate(&mut self);
}

/// A live capture process: byte-readable output plus a kill switch
pub struct CaptureHandle {
    /// The process's raw output stream
    pub output: CaptureOutput,
    /// Handle used to terminate the process
    pub control: Box<dyn CaptureControl>,
}

/// Spawns the external capture process for a session
pub trait CaptureBackend: Send + Sync {
    /// Launch the capture process with the configured resolution, framerate,
    /// and quality, capturing continuously to a readable output pipe
    fn spawn(&self, config: &CaptureConfig) -> Result<CaptureHandle>;
}

struct ChildControl {
    child: Child,
}

impl CaptureControl for ChildControl {
    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::warn!(error = %e, "Failed to kill capture process");
        }
    }
}

fn spawn_piped(mut cmd: Command) -> Result<CaptureHandle> {
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(CaptureError::Spawn)?;
    let stdout = child.stdout.take().ok_or(CaptureError::OutputUnavailable)?;

    Ok(CaptureHandle {
        output: Box::new(stdout),
        control: Box::new(ChildControl { child }),
    })
}

/// `rpicam-vid` backend for Raspberry Pi camera modules
#[derive(Debug, Clone)]
pub struct RpicamBackend {
    program: String,
}

impl RpicamBackend {
    /// Backend invoking `rpicam-vid` from `PATH`
    pub fn new() -> Self {
        Self {
            program: "rpicam-vid".to_string(),
        }
    }

    /// Backend invoking a specific binary (e.g. the older `libcamera-vid`)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RpicamBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for RpicamBackend {
    fn spawn(&self, config: &CaptureConfig) -> Result<CaptureHandle> {
        let mut cmd = Command::new(&self.program);
        cmd.args(rpicam_args(config));

        tracing::info!(
            program = %self.program,
            width = config.width,
            height = config.height,
            framerate = config.framerate,
            "Starting capture process"
        );
        spawn_piped(cmd)
    }
}

fn rpicam_args(config: &CaptureConfig) -> Vec<String> {
    vec![
        "-t".into(),
        "0".into(),
        "--codec".into(),
        "mjpeg".into(),
        "--width".into(),
        config.width.to_string(),
        "--height".into(),
        config.height.to_string(),
        "--framerate".into(),
        config.framerate.to_string(),
        "--quality".into(),
        config.quality.to_string(),
        "--inline".into(),
        "-o".into(),
        "-".into(),
    ]
}

/// `ffmpeg` backend reading a Video4Linux2 device
#[derive(Debug, Clone)]
pub struct V4l2Backend {
    program: String,
    device: String,
}

impl V4l2Backend {
    /// Backend capturing from the given device path (e.g. `/dev/video0`)
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            device: device.into(),
        }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new("/dev/video0")
    }
}

impl CaptureBackend for V4l2Backend {
    fn spawn(&self, config: &CaptureConfig) -> Result<CaptureHandle> {
        let mut cmd = Command::new(&self.program);
        cmd.args(v4l2_args(&self.device, config));

        tracing::info!(
            program = %self.program,
            device = %self.device,
            width = config.width,
            height = config.height,
            framerate = config.framerate,
            "Starting capture process"
        );
        spawn_piped(cmd)
    }
}

fn v4l2_args(device: &str, config: &CaptureConfig) -> Vec<String> {
    vec![
        "-f".into(),
        "video4linux2".into(),
        "-s".into(),
        format!("{}x{}", config.width, config.height),
        "-i".into(),
        device.into(),
        "-f".into(),
        "mpjpeg".into(),
        "-q:v".into(),
        config.quality.to_string(),
        "-vf".into(),
        format!("scale={}:{}", config.width, config.height),
        "-r".into(),
        config.framerate.to_string(),
        "pipe:1".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpicam_args() {
        let config = CaptureConfig::default()
            .resolution(800, 448)
            .framerate(60)
            .quality(7);
        let args = rpicam_args(&config);

        // Continuous capture to stdout.
        assert_eq!(args[..2], ["-t", "0"]);
        assert_eq!(args[args.len() - 2..], ["-o", "-"]);
        assert!(args.windows(2).any(|w| w == ["--width", "800"]));
        assert!(args.windows(2).any(|w| w == ["--height", "448"]));
        assert!(args.windows(2).any(|w| w == ["--framerate", "60"]));
        assert!(args.windows(2).any(|w| w == ["--quality", "7"]));
    }

    #[test]
    fn test_v4l2_args() {
        let config = CaptureConfig::default().resolution(640, 480).framerate(25);
        let args = v4l2_args("/dev/video2", &config);

        assert!(args.windows(2).any(|w| w == ["-i", "/dev/video2"]));
        assert!(args.windows(2).any(|w| w == ["-s", "640x480"]));
        assert!(args.windows(2).any(|w| w == ["-f", "mpjpeg"]));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }
}
