//! Progress event sink.

use reelweave_core::ProgressEvent;
use std::sync::Arc;

/// Consumer of progress events (a UI, a log, a channel).
///
/// `emit` is called from the orchestration path and must return promptly.
/// An implementation that cannot keep up drops events instead of blocking,
/// and never reports failure back to the pipeline.
pub trait ProgressReporter: Send + Sync {
    /// Accept one event.
    fn emit(&self, event: ProgressEvent);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn emit(&self, event: ProgressEvent) {
        (**self).emit(event)
    }
}
