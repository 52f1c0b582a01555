//! Pipeline orchestration error types.

/// Specific error conditions raised by the orchestrator itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// A status change that would move the job backwards or out of a terminal state
    #[display("Invalid job transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// The job is not known to the orchestrator or repository
    #[display("Job not found: {}", _0)]
    JobNotFound(String),
    /// Script generation or segmentation produced no scenes
    #[display("Script for job {} produced no scenes", _0)]
    EmptyScript(String),
    /// Scene indices are not contiguous from zero
    #[display("Scene indices are not contiguous: {}", _0)]
    NonContiguousScenes(String),
    /// The job was cancelled by the caller
    #[display("Job {} was cancelled", _0)]
    Cancelled(String),
    /// Only failed jobs can be resumed
    #[display("Job {} cannot be resumed from status {}", job, status)]
    NotResumable {
        /// Job id
        job: String,
        /// Current status
        status: String,
    },
}

/// Error type for orchestration failures.
///
/// # Examples
///
/// ```
/// use reelweave_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::EmptyScript("job-7".to_string()));
/// assert!(format!("{}", err).contains("produced no scenes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
