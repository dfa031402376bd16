//! Capture configuration

use std::time::Duration;

use crate::framing::FramingMode;

/// Capture session configuration options
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Target capture framerate
    pub framerate: u32,

    /// Encoder quality, in the backend's own scale
    /// (rpicam: 1-100, ffmpeg `-q:v`: 2-31 where lower is better)
    pub quality: u32,

    /// Seconds of frames each viewer queue can hold
    pub buffer_factor: usize,

    /// Framing strategy matching the capture tool's output
    pub framing: FramingMode,

    /// How long the viewer set may stay empty before capture is stopped
    pub idle_grace: Duration,

    /// How often the idle reaper checks
    pub reap_interval: Duration,

    /// Read size for the capture process's output pipe
    pub read_chunk_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            framerate: 30,
            quality: 50,
            buffer_factor: 5,
            framing: FramingMode::default(),
            idle_grace: Duration::from_secs(5),
            reap_interval: Duration::from_secs(1),
            read_chunk_size: 4096,
        }
    }
}

impl CaptureConfig {
    /// Set the frame resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the target framerate
    pub fn framerate(mut self, fps: u32) -> Self {
        self.framerate = fps;
        self
    }

    /// Set the encoder quality (backend's own scale)
    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Set the viewer queue depth in seconds of frames
    pub fn buffer_factor(mut self, factor: usize) -> Self {
        self.buffer_factor = factor;
        self
    }

    /// Set the framing strategy
    pub fn framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Set the idle grace window
    pub fn idle_grace(mut self, grace: Duration) -> Self {
        self.idle_grace = grace;
        self
    }

    /// Set the idle reaper check interval
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Internal frame channel capacity: one second of frames
    pub fn channel_capacity(&self) -> usize {
        self.framerate.max(1) as usize
    }

    /// Per-viewer queue capacity: `framerate × buffer_factor`
    pub fn viewer_capacity(&self) -> usize {
        (self.framerate as usize * self.buffer_factor).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();

        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.framerate, 30);
        assert_eq!(config.framing, FramingMode::Markers);
        assert_eq!(config.idle_grace, Duration::from_secs(5));
        assert_eq!(config.reap_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_derived_capacities() {
        let config = CaptureConfig::default().framerate(60).buffer_factor(5);

        assert_eq!(config.channel_capacity(), 60);
        assert_eq!(config.viewer_capacity(), 300);
    }

    #[test]
    fn test_capacities_never_zero() {
        let config = CaptureConfig::default().framerate(0).buffer_factor(0);

        assert_eq!(config.channel_capacity(), 1);
        assert_eq!(config.viewer_capacity(), 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = CaptureConfig::default()
            .resolution(800, 448)
            .framerate(60)
            .quality(7)
            .framing(FramingMode::Multipart)
            .idle_grace(Duration::from_secs(10))
            .reap_interval(Duration::from_millis(500));

        assert_eq!(config.width, 800);
        assert_eq!(config.height, 448);
        assert_eq!(config.framerate, 60);
        assert_eq!(config.quality, 7);
        assert_eq!(config.framing, FramingMode::Multipart);
        assert_eq!(config.idle_grace, Duration::from_secs(10));
        assert_eq!(config.reap_interval, Duration::from_millis(500));
    }
}
