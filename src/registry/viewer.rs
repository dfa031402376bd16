//! Viewer identity and scoped subscription handle

use std::sync::Arc;

use tokio::sync::mpsc;

use super::store::SubscriberSet;
use crate::framing::Frame;

/// Opaque identity of one attached viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(u64);

impl ViewerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// A viewer's end of the stream: a bounded frame queue that detaches itself
///
/// Dropping the subscription performs the matching detach, so every exit
/// path out of a transport handler (completion, disconnect, error) releases
/// the viewer exactly once. Frames still queued at drop time are discarded
/// with the receiver.
pub struct Subscription {
    id: ViewerId,
    rx: mpsc::Receiver<Frame>,
    set: Arc<SubscriberSet>,
}

impl Subscription {
    pub(crate) fn new(id: ViewerId, rx: mpsc::Receiver<Frame>, set: Arc<SubscriberSet>) -> Self {
        Self { id, rx, set }
    }

    /// This viewer's identity
    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Receive the next frame in capture order
    ///
    /// Frames dropped under backpressure leave gaps; ordering of the frames
    /// that do arrive is preserved. Pends while capture is stopped and
    /// resumes if it restarts.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take a frame if one is already queued
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.set.detach(self.id);
    }
}
