//! Progress events.

use crate::{JobId, JobStatus, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall progress while the script is being written.
pub const SCRIPT_PROGRESS: f32 = 0.05;
/// Overall progress when scene work begins.
pub const SCENES_START_PROGRESS: f32 = 0.10;
/// Overall progress when scene work ends and assembly begins.
pub const ASSEMBLY_PROGRESS: f32 = 0.85;

/// Overall progress after `finished` of `total` scenes are done.
///
/// # Examples
///
/// ```
/// use reelweave_core::scene_progress;
///
/// assert_eq!(scene_progress(0, 4), 0.10);
/// assert_eq!(scene_progress(4, 4), 0.85);
/// assert!(scene_progress(2, 4) > 0.4 && scene_progress(2, 4) < 0.5);
/// ```
pub fn scene_progress(finished: usize, total: usize) -> f32 {
    if finished >= total {
        return ASSEMBLY_PROGRESS;
    }
    let ratio = finished as f32 / total as f32;
    SCENES_START_PROGRESS + (ASSEMBLY_PROGRESS - SCENES_START_PROGRESS) * ratio
}

/// Overall progress at the moment a job enters `status`.
pub fn status_progress(status: JobStatus) -> f32 {
    match status {
        JobStatus::Pending => 0.0,
        JobStatus::GeneratingScript => SCRIPT_PROGRESS,
        JobStatus::GeneratingScenes => SCENES_START_PROGRESS,
        JobStatus::Assembling => ASSEMBLY_PROGRESS,
        JobStatus::Completed => 1.0,
        JobStatus::Failed => 0.0,
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// The job changed status
    Transition {
        /// Previous status
        from: JobStatus,
        /// New status
        to: JobStatus,
        /// Human-readable detail
        detail: String,
    },
    /// A backend call is about to be made
    Attempt {
        /// Stage being run
        stage: Stage,
        /// Scene, for per-scene stages
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scene_index: Option<usize>,
        /// Attempt number, starting at 1
        attempt: u32,
    },
    /// A scene task started
    SceneStarted {
        /// Scene index
        scene_index: usize,
        /// Number of scenes in the job
        scene_total: usize,
    },
    /// One half (image or audio) of a scene finished
    SceneTaskFinished {
        /// Scene index
        scene_index: usize,
        /// Number of scenes in the job
        scene_total: usize,
        /// Image or audio
        stage: Stage,
        /// Whether it succeeded
        success: bool,
    },
    /// Both halves of a scene are done
    SceneFinished {
        /// Scene index
        scene_index: usize,
        /// Number of scenes in the job
        scene_total: usize,
        /// Whether the scene is complete
        success: bool,
    },
}

/// One entry in a job's progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Job the event belongs to
    pub job_id: JobId,
    /// Emission order within the job, starting at 0
    pub sequence: u64,
    /// Overall progress in `[0, 1]`
    pub progress: f32,
    /// Emission time
    pub timestamp: DateTime<Utc>,
    /// Payload
    pub kind: ProgressEventKind,
}

impl ProgressEvent {
    /// Short display text, e.g. `Scene 3/5: generating illustration`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use reelweave_core::{JobId, ProgressEvent, ProgressEventKind, Stage};
    ///
    /// let event = ProgressEvent {
    ///     job_id: JobId::new(),
    ///     sequence: 7,
    ///     progress: 0.4,
    ///     timestamp: Utc::now(),
    ///     kind: ProgressEventKind::Attempt { stage: Stage::Image, scene_index: Some(2), attempt: 1 },
    /// };
    /// assert_eq!(event.describe(), "generating illustration for scene 3");
    /// ```
    pub fn describe(&self) -> String {
        match &self.kind {
            ProgressEventKind::Transition { from, to, detail } if detail.is_empty() => {
                format!("{} -> {}", from, to)
            }
            ProgressEventKind::Transition { detail, .. } => detail.clone(),
            ProgressEventKind::Attempt {
                stage,
                scene_index,
                attempt,
            } => {
                let mut text = stage.activity().to_string();
                if let Some(index) = scene_index {
                    text.push_str(&format!(" for scene {}", index + 1));
                }
                if *attempt > 1 {
                    text.push_str(&format!(" (attempt {})", attempt));
                }
                text
            }
            ProgressEventKind::SceneStarted {
                scene_index,
                scene_total,
            } => format!("Scene {}/{}: started", scene_index + 1, scene_total),
            ProgressEventKind::SceneTaskFinished {
                scene_index,
                scene_total,
                stage,
                success,
            } => format!(
                "Scene {}/{}: {} {}",
                scene_index + 1,
                scene_total,
                stage.activity(),
                if *success { "done" } else { "failed" }
            ),
            ProgressEventKind::SceneFinished {
                scene_index,
                scene_total,
                success,
            } => format!(
                "Scene {}/{}: {}",
                scene_index + 1,
                scene_total,
                if *success { "complete" } else { "failed" }
            ),
        }
    }
}
