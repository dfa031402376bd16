//! Subscriber set implementation
//!
//! Tracks every attached viewer's delivery queue together with the idle
//! timestamp that drives capture teardown. The two always change together
//! under one lock, so they can never be observed in an inconsistent pairing.
//!
//! The lock is a plain `std::sync::Mutex`: every critical section is short
//! and free of I/O, and a synchronous lock keeps detach callable from `Drop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::viewer::ViewerId;
use crate::framing::Frame;

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastOutcome {
    /// Viewers that accepted the frame
    pub delivered: usize,
    /// Viewers whose queue was full (frame dropped for them only)
    pub dropped: usize,
}

struct Inner {
    viewers: HashMap<ViewerId, mpsc::Sender<Frame>>,
    /// When the set last became empty; `None` while non-empty
    idle_since: Option<Instant>,
}

/// Thread-safe set of attached viewers
///
/// Attach and detach mutate the set; the broadcaster iterates it read-only,
/// holding the lock for the duration of one fan-out pass so the iteration is
/// never torn by a concurrent detach.
pub struct SubscriberSet {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl SubscriberSet {
    /// Create an empty set
    ///
    /// A fresh set counts as idle: a session started with no viewers is
    /// reaped once the grace window passes.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                viewers: HashMap::new(),
                idle_since: Some(Instant::now()),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new viewer with a bounded delivery queue
    pub fn attach(&self, capacity: usize) -> (ViewerId, mpsc::Receiver<Frame>) {
        let id = ViewerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let mut inner = self.inner.lock().unwrap();
        inner.viewers.insert(id, tx);
        inner.idle_since = None;

        tracing::info!(viewer = %id, viewers = inner.viewers.len(), "Viewer attached");
        (id, rx)
    }

    /// Remove a viewer, discarding anything still queued for it
    ///
    /// Safe to call for an already-removed viewer. If the set becomes empty,
    /// the idle timestamp is armed.
    pub fn detach(&self, id: ViewerId) {
        let mut inner = self.inner.lock().unwrap();
        if inner.viewers.remove(&id).is_none() {
            return;
        }

        let remaining = inner.viewers.len();
        if remaining == 0 {
            inner.idle_since = Some(Instant::now());
        }

        tracing::info!(viewer = %id, viewers = remaining, "Viewer detached");
    }

    /// Push a frame to every viewer, non-blocking
    ///
    /// A viewer whose queue is full misses this frame; delivery to the other
    /// viewers is unaffected.
    pub fn broadcast(&self, frame: &Frame) -> BroadcastOutcome {
        let inner = self.inner.lock().unwrap();
        let mut outcome = BroadcastOutcome::default();

        for (id, tx) in &inner.viewers {
            match tx.try_send(frame.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    outcome.dropped += 1;
                    tracing::debug!(viewer = %id, "Frame dropped: viewer queue full");
                }
                // Receiver already gone; detach will remove the entry.
                Err(TrySendError::Closed(_)) => {}
            }
        }

        outcome
    }

    /// Number of attached viewers
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().viewers.len()
    }

    /// How long the set has been empty, if it is
    pub fn idle_for(&self) -> Option<Duration> {
        self.inner.lock().unwrap().idle_since.map(|t| t.elapsed())
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::new()
    }
}
