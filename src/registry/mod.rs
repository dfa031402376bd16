//! Viewer subscription registry
//!
//! Tracks the set of connected viewers and their delivery queues. Each viewer
//! owns an independent bounded queue; the broadcaster pushes every frame to
//! every queue with a non-blocking send, so one slow viewer drops frames
//! without stalling capture or the other viewers.
//!
//! The registry also owns the idle timestamp: the moment the viewer set
//! becomes empty it is armed, and the idle reaper stops capture once it ages
//! past the grace window. Attaching a viewer disarms it. Both live behind a
//! single lock so they always change together.

pub mod store;
pub mod viewer;

pub use store::{BroadcastOutcome, SubscriberSet};
pub use viewer::{Subscription, ViewerId};
