//! Capture pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for a capture session
///
/// Updated lock-free from the reader and broadcaster tasks; survives capture
/// restarts within the same session.
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames: AtomicU64,
    bytes_read: AtomicU64,
    channel_drops: AtomicU64,
    viewer_drops: AtomicU64,
}

impl CaptureStats {
    pub(crate) fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bytes(&self, n: u64) {
        self.bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_channel_drop(&self) {
        self.channel_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_viewer_drops(&self, n: u64) {
        self.viewer_drops.fetch_add(n, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            channel_drops: self.channel_drops.load(Ordering::Relaxed),
            viewer_drops: self.viewer_drops.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`CaptureStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames fully reassembled from the capture stream
    pub frames: u64,
    /// Raw bytes read from the capture process
    pub bytes_read: u64,
    /// Frames dropped because the internal channel was full
    pub channel_drops: u64,
    /// Frame deliveries dropped because a viewer queue was full
    pub viewer_drops: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CaptureStats::default();

        stats.record_frame();
        stats.record_frame();
        stats.record_bytes(4096);
        stats.record_channel_drop();
        stats.record_viewer_drops(3);

        let snap = stats.snapshot();
        assert_eq!(snap.frames, 2);
        assert_eq!(snap.bytes_read, 4096);
        assert_eq!(snap.channel_drops, 1);
        assert_eq!(snap.viewer_drops, 3);
    }
}
