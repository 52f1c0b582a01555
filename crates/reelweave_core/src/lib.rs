//! Core data types for the reelweave video pipeline.
//!
//! This crate holds the data model shared by every other reelweave crate:
//! scenes and scripts, the [`GenerationJob`] aggregate with its status
//! machine, asset references, backend configuration and selection,
//! stage outcomes, and progress events. It also owns the deterministic
//! segmentation rule that splits a fixed script into scenes.
//!
//! Nothing here performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod backend_config;
mod ids;
mod job;
mod policy;
mod progress;
mod scene;
mod segment;
mod selection;
mod stage;

pub use asset::{AssetKind, AudioAsset, ImageAsset, VideoAsset};
pub use backend_config::{BackendConfig, BackendKind};
pub use ids::JobId;
pub use job::{GenerationJob, JobInput, JobStatus};
pub use policy::ScenePolicy;
pub use progress::{
    ASSEMBLY_PROGRESS, ProgressEvent, ProgressEventKind, SCENES_START_PROGRESS,
    SCRIPT_PROGRESS, scene_progress, status_progress,
};
pub use scene::{Scene, SceneScript, ScriptSegment, check_contiguous};
pub use segment::{SegmentationRule, build_image_prompt, derive_title, segment_script};
pub use selection::{
    AssemblySettings, BackendSelection, BackendSelectionBuilder, BgmMode, BgmTrack,
    RenderSettings, ScriptSettings, VoiceSettings,
};
pub use stage::{ErrorInfo, FailureKind, Stage, StageResult};
