//! Callback trait for upload workflow events.
//!
//! Register an [`Arc<dyn UploadObserver>`] with
//! [`crate::CvUploadWidget::add_observer`] to react to state changes from
//! a rendering layer, a logger, or a test. For a pull-based view of the same
//! information use [`crate::CvUploadWidget::subscribe`] instead.
//!
//! # Example
//!
//! ```rust
//! use jobmagnetic_cv::{UploadObserver, UploadStatus};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     transitions: AtomicUsize,
//! }
//!
//! impl UploadObserver for CountingObserver {
//!     fn on_state_change(&self, _from: UploadStatus, _to: UploadStatus) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { transitions: AtomicUsize::new(0) });
//! observer.on_state_change(UploadStatus::Idle, UploadStatus::Analyzing);
//! assert_eq!(observer.transitions.load(Ordering::SeqCst), 1);
//! ```

use crate::machine::UploadStatus;
use crate::messages::Notice;
use std::sync::Arc;

/// Called by the widget as the workflow progresses.
///
/// Callbacks run synchronously on the task that applied the event, after
/// the widget's internal lock has been released. All methods default to
/// no-ops.
pub trait UploadObserver: Send + Sync {
    /// The status changed. Not called for events that leave it unchanged.
    fn on_state_change(&self, from: UploadStatus, to: UploadStatus) {
        let _ = (from, to);
    }

    /// A categorised notice was raised (validation, extraction or
    /// submission problem).
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    /// A profile was created and is reachable at `url`.
    fn on_profile_created(&self, url: &str) {
        let _ = url;
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

pub type SharedObserver = Arc<dyn UploadObserver>;
