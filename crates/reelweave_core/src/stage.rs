//! Stage outcomes.
//!
//! Everything that runs a backend reports back through [`StageResult`], so
//! the orchestrator never has to match on backend error types to decide
//! what happens to a job.

use reelweave_error::{ErrorClass, ReelweaveError};
use serde::{Deserialize, Serialize};

/// One of the four pipeline phases.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Script generation
    Script,
    /// Per-scene image generation
    Image,
    /// Per-scene speech synthesis
    Audio,
    /// Final composition
    Assembly,
}

impl Stage {
    /// Short present-tense description used in progress messages.
    pub fn activity(&self) -> &'static str {
        match self {
            Stage::Script => "writing script",
            Stage::Image => "generating illustration",
            Stage::Audio => "synthesizing narration",
            Stage::Assembly => "assembling video",
        }
    }
}

/// Job-level failure taxonomy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Bad or missing backend configuration
    Config,
    /// Network, timeout or rate-limit failure that outlived its retry budget
    Transient,
    /// The backend rejected the request as invalid
    Permanent,
    /// Scenes could not complete and the job policy does not tolerate it
    PartialSceneFailure,
    /// Final composition failed; scene assets are kept
    Assembly,
    /// The caller cancelled the job
    Cancelled,
}

impl From<ErrorClass> for FailureKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Transient => FailureKind::Transient,
            ErrorClass::Permanent => FailureKind::Permanent,
            ErrorClass::Config => FailureKind::Config,
        }
    }
}

/// Serializable description of a failure.
///
/// # Examples
///
/// ```
/// use reelweave_core::{ErrorInfo, FailureKind, Stage};
/// use reelweave_error::ErrorClass;
///
/// let info = ErrorInfo::classified(ErrorClass::Permanent, "unsupported size")
///     .in_stage(Stage::Image)
///     .for_scene(1);
///
/// assert_eq!(info.kind, FailureKind::Permanent);
/// assert_eq!(info.scene_index, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Job-level kind
    pub kind: FailureKind,
    /// Human-readable message of the originating error
    pub message: String,
    /// Classification of the originating backend error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ErrorClass>,
    /// Stage in which the failure happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Scene the failure belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<usize>,
    /// Every scene that failed, in index order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_scenes: Vec<usize>,
}

impl ErrorInfo {
    /// Failure of the given kind with no classification.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            class: None,
            stage: None,
            scene_index: None,
            failed_scenes: Vec::new(),
        }
    }

    /// Failure whose kind follows the error class.
    pub fn classified(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class: Some(class),
            ..Self::new(class.into(), message)
        }
    }

    /// Failure describing `error` under `class`.
    pub fn from_error(error: &ReelweaveError, class: ErrorClass) -> Self {
        if error.is_cancellation() {
            return Self::new(FailureKind::Cancelled, error.to_string());
        }
        Self::classified(class, error.to_string())
    }

    /// Attach the stage.
    pub fn in_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attach the scene index.
    pub fn for_scene(mut self, index: usize) -> Self {
        self.scene_index = Some(index);
        self
    }

    /// Replace the kind, keeping message and class.
    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = kind;
        self
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(stage) = self.stage {
            write!(f, " in {} stage", stage)?;
        }
        if let Some(index) = self.scene_index {
            write!(f, " (scene {})", index)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Uniform outcome of one stage invocation.
///
/// Exactly one of `value` and `error` is present, and `attempts` records how
/// many times the backend was called.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult<T> {
    value: Option<T>,
    error: Option<ErrorInfo>,
    attempts: u32,
}

impl<T> StageResult<T> {
    /// Successful outcome.
    pub fn succeeded(value: T, attempts: u32) -> Self {
        Self {
            value: Some(value),
            error: None,
            attempts,
        }
    }

    /// Failed outcome.
    pub fn failed(error: ErrorInfo, attempts: u32) -> Self {
        Self {
            value: None,
            error: Some(error),
            attempts,
        }
    }

    /// Whether the stage produced a value.
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// The produced value.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// The failure description.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Number of backend calls made, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of retries after the first call.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Convert into a plain result.
    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ErrorInfo::new(
                FailureKind::Permanent,
                "stage produced neither value nor error",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_exposes_error() {
        let result: StageResult<u8> = StageResult::failed(
            ErrorInfo::classified(ErrorClass::Transient, "timed out"),
            3,
        );
        assert!(!result.is_success());
        assert_eq!(result.retries(), 2);
        assert_eq!(result.error().map(|e| e.kind), Some(FailureKind::Transient));
        assert!(result.into_result().is_err());
    }

    #[test]
    fn display_mentions_stage_and_scene() {
        let info = ErrorInfo::classified(ErrorClass::Permanent, "bad prompt")
            .in_stage(Stage::Image)
            .for_scene(4);
        assert_eq!(info.to_string(), "permanent in image stage (scene 4): bad prompt");
    }
}
