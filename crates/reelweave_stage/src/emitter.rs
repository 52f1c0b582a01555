//! Per-job progress event producer.

use chrono::Utc;
use reelweave_core::{JobId, ProgressEvent, ProgressEventKind};
use reelweave_interface::ProgressReporter;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct EmitterState {
    sequence: u64,
    progress: f32,
}

/// Stamps events with job id, sequence number and overall progress before
/// handing them to the reporter.
///
/// Sequence numbers are assigned and events delivered under one lock, so the
/// reporter sees them in sequence order even when scene tasks emit
/// concurrently. The reporter is required not to block.
pub struct ProgressEmitter {
    job_id: JobId,
    reporter: Arc<dyn ProgressReporter>,
    state: Mutex<EmitterState>,
}

impl ProgressEmitter {
    /// Emitter for `job_id` writing to `reporter`.
    pub fn new(job_id: JobId, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            job_id,
            reporter,
            state: Mutex::new(EmitterState::default()),
        }
    }

    /// Job this emitter belongs to.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Emit at the current progress.
    pub fn emit(&self, kind: ProgressEventKind) {
        self.send(None, kind);
    }

    /// Advance overall progress and emit. Progress never moves backwards.
    pub fn emit_at(&self, progress: f32, kind: ProgressEventKind) {
        self.send(Some(progress), kind);
    }

    /// Current overall progress.
    pub fn progress(&self) -> f32 {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .progress
    }

    fn send(&self, progress: Option<f32>, kind: ProgressEventKind) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(progress) = progress {
            state.progress = state.progress.max(progress.clamp(0.0, 1.0));
        }
        let event = ProgressEvent {
            job_id: self.job_id,
            sequence: state.sequence,
            progress: state.progress,
            timestamp: Utc::now(),
            kind,
        };
        state.sequence += 1;
        self.reporter.emit(event);
    }
}

impl std::fmt::Debug for ProgressEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressEmitter")
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}
