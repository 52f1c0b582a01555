//! The generation job aggregate and its status machine.

use crate::{BackendSelection, ErrorInfo, JobId, Scene, VideoAsset};
use chrono::{DateTime, Utc};
use reelweave_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};

/// What the job starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobInput {
    /// Generate a script about this topic
    Topic(String),
    /// Use this text as the script; generation is skipped
    FixedScript(String),
}

impl JobInput {
    /// The raw topic or script text.
    pub fn text(&self) -> &str {
        match self {
            JobInput::Topic(text) | JobInput::FixedScript(text) => text,
        }
    }

    /// Whether script generation is skipped.
    pub fn is_fixed_script(&self) -> bool {
        matches!(self, JobInput::FixedScript(_))
    }
}

/// Lifecycle of a [`GenerationJob`].
///
/// Statuses only move forward. `Failed` can be entered from any
/// non-terminal status; `Completed` and `Failed` are terminal.
///
/// # Examples
///
/// ```
/// use reelweave_core::JobStatus;
///
/// assert!(JobStatus::Pending.can_transition_to(JobStatus::GeneratingScenes));
/// assert!(JobStatus::Assembling.can_transition_to(JobStatus::Failed));
/// assert!(!JobStatus::Assembling.can_transition_to(JobStatus::GeneratingScenes));
/// assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Created, not started
    #[default]
    Pending,
    /// Waiting on the scripter
    GeneratingScript,
    /// Scene images and audio in progress
    GeneratingScenes,
    /// Waiting on the assembler
    Assembling,
    /// Video produced
    Completed,
    /// Terminal failure
    Failed,
}

impl JobStatus {
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::GeneratingScript => 1,
            JobStatus::GeneratingScenes => 2,
            JobStatus::Assembling => 3,
            JobStatus::Completed => 4,
            JobStatus::Failed => 5,
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Failed => true,
            JobStatus::Completed => *self == JobStatus::Assembling,
            _ => next.rank() > self.rank(),
        }
    }
}

/// Root aggregate for one topic-to-video run.
///
/// # Examples
///
/// ```
/// use reelweave_core::{BackendSelection, GenerationJob, JobInput, JobStatus};
///
/// let mut job = GenerationJob::new(
///     JobInput::Topic("habit of reading".into()),
///     BackendSelection::default(),
/// );
/// job.transition_to(JobStatus::GeneratingScript).unwrap();
/// job.transition_to(JobStatus::Failed).unwrap();
///
/// assert!(job.finished_at.is_some());
/// assert!(job.transition_to(JobStatus::Assembling).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Unique id
    pub id: JobId,
    /// Topic or fixed script
    pub input: JobInput,
    /// Title passed to assembly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Backends and their parameters
    pub selection: BackendSelection,
    /// Scenes in index order
    #[serde(default)]
    pub scenes: Vec<Scene>,
    status: JobStatus,
    /// Final video once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoAsset>,
    /// Failure that terminated the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ErrorInfo>,
    /// Scenes left out of the video under the best-effort policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted_scenes: Vec<usize>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Job this one was resumed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<JobId>,
}

impl GenerationJob {
    /// A fresh pending job.
    pub fn new(input: JobInput, selection: BackendSelection) -> Self {
        Self {
            id: JobId::new(),
            input,
            title: None,
            selection,
            scenes: Vec::new(),
            status: JobStatus::Pending,
            video: None,
            failure: None,
            omitted_scenes: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
            resumed_from: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move to `next`, stamping `finished_at` on terminal statuses.
    #[track_caller]
    pub fn transition_to(&mut self, next: JobStatus) -> Result<JobStatus, PipelineError> {
        if !self.status.can_transition_to(next) {
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            }));
        }
        let previous = self.status;
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(previous)
    }

    /// A new pending job that picks up where a failed one stopped.
    ///
    /// Scenes and their generated assets carry over, so running the new job
    /// skips script generation and every asset that already exists.
    #[track_caller]
    pub fn resume_from(failed: &GenerationJob) -> Result<Self, PipelineError> {
        if failed.status != JobStatus::Failed {
            return Err(PipelineError::new(PipelineErrorKind::NotResumable {
                job: failed.id.to_string(),
                status: failed.status.to_string(),
            }));
        }
        Ok(Self {
            title: failed.title.clone(),
            scenes: failed.scenes.clone(),
            resumed_from: Some(failed.id),
            ..Self::new(failed.input.clone(), failed.selection.clone())
        })
    }

    /// A new pending job with the same input and backend selection.
    ///
    /// Nothing generated carries over: the script, title and every asset
    /// are produced again when the copy runs.
    pub fn duplicate(&self) -> Self {
        Self::new(self.input.clone(), self.selection.clone())
    }

    /// Scenes with both assets generated.
    pub fn completed_scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(|scene| scene.is_complete())
    }

    /// Title for assembly: the explicit title, or one derived from the input.
    pub fn effective_title(&self, max_chars: usize) -> String {
        match (&self.title, &self.input) {
            (Some(title), _) => title.clone(),
            (None, JobInput::Topic(topic)) => topic.trim().to_string(),
            (None, JobInput::FixedScript(script)) => crate::derive_title(script, max_chars),
        }
    }
}
