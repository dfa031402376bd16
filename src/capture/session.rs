//! Camera session lifecycle
//!
//! One `CameraSession` owns the single logical instance of "camera is
//! capturing": the capture subprocess, the frame reassembly and fan-out
//! tasks, and the idle reaper. The session is created stopped and is usually
//! started lazily by the first [`attach`](CameraSession::attach).
//!
//! While running, three tasks cooperate:
//!
//! - the **reader** pulls raw bytes from the capture process and feeds the
//!   frame scanner; assembled frames go onto a bounded channel
//! - the **broadcaster** takes frames off that channel and fans each one out
//!   to every viewer queue, non-blocking
//! - the **idle reaper** stops capture once the viewer set has been empty
//!   past the grace window
//!
//! Teardown always follows one path: killing the capture process ends the
//! reader's stream, the reader's exit drops the channel sender, and the
//! closed channel lets the broadcaster drain and finish. `stop` is safe to
//! call from any of the triggers (explicit, read end/error, idle timeout)
//! because it is idempotent.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::backend::{CaptureBackend, CaptureControl, CaptureOutput, RpicamBackend};
use super::config::CaptureConfig;
use crate::device::{IndicatorLight, NoLight};
use crate::error::Result;
use crate::framing::Frame;
use crate::registry::{SubscriberSet, Subscription};
use crate::stats::{CaptureStats, StatsSnapshot};

/// A supervised live-capture session
///
/// Owned by the surrounding application context and shared behind an `Arc`.
/// `start` and `stop` are idempotent; `is_running` is eventually consistent
/// (the flag may flip right after being read).
pub struct CameraSession {
    config: CaptureConfig,
    backend: Box<dyn CaptureBackend>,
    light: Arc<dyn IndicatorLight>,
    running: AtomicBool,
    /// Increments on every cold start. A reader task from a previous run
    /// must not tear down the run that replaced it.
    epoch: AtomicU64,
    /// Kill switch for the live capture process; separate from the registry
    /// lock so terminating never contends with attach/detach.
    control: Mutex<Option<Box<dyn CaptureControl>>>,
    subscribers: Arc<SubscriberSet>,
    stats: CaptureStats,
}

impl CameraSession {
    /// Create a stopped session using the `rpicam-vid` backend and no light
    pub fn new(config: CaptureConfig) -> Self {
        Self::with_parts(config, Box::new(RpicamBackend::new()), Arc::new(NoLight))
    }

    /// Create a stopped session with an explicit backend and light controller
    pub fn with_parts(
        config: CaptureConfig,
        backend: Box<dyn CaptureBackend>,
        light: Arc<dyn IndicatorLight>,
    ) -> Self {
        Self {
            config,
            backend,
            light,
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            control: Mutex::new(None),
            subscribers: Arc::new(SubscriberSet::new()),
            stats: CaptureStats::default(),
        }
    }

    /// The session configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Whether capture is currently running
    ///
    /// Eventually consistent: the flag may flip immediately after the read.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of attached viewers
    pub fn viewer_count(&self) -> usize {
        self.subscribers.count()
    }

    /// Cumulative pipeline counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Start capturing
    ///
    /// No-op if already running. On a cold start, spawns the capture process
    /// and the reader, broadcaster, and idle-reaper tasks. A spawn failure
    /// leaves the session stopped with no task running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!(
            width = self.config.width,
            height = self.config.height,
            framerate = self.config.framerate,
            "Starting camera"
        );

        let handle = match self.backend.spawn(&self.config) {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.control.lock().unwrap() = Some(handle.control);

        let (tx, rx) = mpsc::channel(self.config.channel_capacity());

        let session = Arc::clone(self);
        let output = handle.output;
        tokio::spawn(async move {
            session.read_loop(output, tx).await;
            // Deferred teardown: whatever ended the read loop ends this run.
            session.stop_run(epoch);
        });

        let session = Arc::clone(self);
        tokio::spawn(async move { session.broadcast_loop(rx).await });

        let session = Arc::clone(self);
        tokio::spawn(async move { session.idle_loop(epoch).await });

        Ok(())
    }

    /// Stop capturing
    ///
    /// No-op if not running. Terminates the capture process and turns off
    /// and releases the light controller, regardless of what triggered the
    /// stop. Attached viewers stay registered and resume on a later start.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(mut control) = self.control.lock().unwrap().take() {
            control.terminate();
        }

        self.light.turn_off();
        self.light.stop();
        tracing::info!("Camera stopped");
    }

    /// Stop only if `epoch` is still the current run
    fn stop_run(&self, epoch: u64) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        self.stop();

        // A stop that raced ahead of control registration leaves the
        // process behind; reap it here.
        if let Some(mut control) = self.control.lock().unwrap().take() {
            control.terminate();
        }
    }

    /// Attach a viewer, lazily starting capture
    ///
    /// The returned subscription detaches itself on drop, so every exit path
    /// out of the transport handler releases the viewer exactly once.
    pub fn attach(self: &Arc<Self>) -> Result<Subscription> {
        self.start()?;

        let (id, rx) = self.subscribers.attach(self.config.viewer_capacity());
        Ok(Subscription::new(id, rx, Arc::clone(&self.subscribers)))
    }

    async fn read_loop(&self, mut output: CaptureOutput, tx: mpsc::Sender<Frame>) {
        let mut scanner = self.config.framing.scanner();
        let mut buf = vec![0u8; self.config.read_chunk_size];

        while self.is_running() {
            match output.read(&mut buf).await {
                Ok(0) => {
                    tracing::info!("Camera stream ended");
                    return;
                }
                Ok(n) => {
                    self.stats.record_bytes(n as u64);
                    scanner.push(&buf[..n]);

                    while let Some(frame) = scanner.next_frame() {
                        self.stats.record_frame();
                        match tx.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                self.stats.record_channel_drop();
                                tracing::debug!("Frame dropped: channel full");
                            }
                            Err(TrySendError::Closed(_)) => return,
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Camera read error");
                    return;
                }
            }
        }
    }

    /// Runs until the reader drops its sender
    async fn broadcast_loop(&self, mut rx: mpsc::Receiver<Frame>) {
        while let Some(frame) = rx.recv().await {
            let outcome = self.subscribers.broadcast(&frame);
            if outcome.dropped > 0 {
                self.stats.record_viewer_drops(outcome.dropped as u64);
            }
        }
    }

    async fn idle_loop(&self, epoch: u64) {
        let mut ticker = tokio::time::interval(self.config.reap_interval);
        ticker.tick().await; // first tick completes immediately

        loop {
            ticker.tick().await;

            if self.epoch.load(Ordering::SeqCst) != epoch || !self.is_running() {
                return;
            }

            if let Some(idle) = self.subscribers.idle_for() {
                if idle >= self.config.idle_grace {
                    tracing::info!(
                        idle_ms = idle.as_millis() as u64,
                        "No viewers past grace period, stopping camera"
                    );
                    self.stop_run(epoch);
                    return;
                }
            }
        }
    }
}
