//! Orchestrator settings.

use reelweave_core::{ScenePolicy, SegmentationRule, Stage};
use reelweave_stage::{PipelineConfig, RetryPolicy};
use std::path::PathBuf;

/// Knobs the orchestrator runs with.
///
/// Usually derived from [`PipelineConfig`]; the builder is handy in tests.
///
/// # Examples
///
/// ```
/// use reelweave_core::ScenePolicy;
/// use reelweave_pipeline::OrchestratorSettings;
///
/// let settings = OrchestratorSettings::builder()
///     .concurrency(2usize)
///     .scene_policy(ScenePolicy::BestEffort)
///     .output_dir("/tmp/reelweave")
///     .build()
///     .unwrap();
///
/// assert_eq!(*settings.concurrency(), 2);
/// assert_eq!(*settings.title_max_chars(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct OrchestratorSettings {
    /// Scenes in flight at once
    #[builder(default = "3")]
    concurrency: usize,
    /// What to do with failed scenes
    #[builder(default)]
    scene_policy: ScenePolicy,
    /// How fixed scripts are cut into scenes
    #[builder(default)]
    segmentation: SegmentationRule,
    /// Length of titles derived from a fixed script
    #[builder(default = "20")]
    title_max_chars: usize,
    /// Narrations per image prompt request
    #[builder(default = "10")]
    prompt_batch_size: usize,
    /// Root directory for job output
    #[builder(default = "PathBuf::from(\"output\")")]
    output_dir: PathBuf,
    /// Retry policy for script generation
    #[builder(default)]
    script_retry: RetryPolicy,
    /// Retry policy for image generation
    #[builder(default)]
    image_retry: RetryPolicy,
    /// Retry policy for speech synthesis
    #[builder(default)]
    audio_retry: RetryPolicy,
    /// Retry policy for assembly
    #[builder(default)]
    assembly_retry: RetryPolicy,
}

impl OrchestratorSettings {
    /// Start building settings.
    pub fn builder() -> OrchestratorSettingsBuilder {
        OrchestratorSettingsBuilder::default()
    }

    /// Settings taken from a loaded configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.pipeline.concurrency.max(1),
            scene_policy: config.pipeline.scene_policy,
            segmentation: config.pipeline.segmentation,
            title_max_chars: config.pipeline.title_max_chars,
            prompt_batch_size: config.pipeline.prompt_batch_size.max(1),
            output_dir: config.pipeline.output_dir.clone(),
            script_retry: config.retry_policy(Stage::Script),
            image_retry: config.retry_policy(Stage::Image),
            audio_retry: config.retry_policy(Stage::Audio),
            assembly_retry: config.retry_policy(Stage::Assembly),
        }
    }

    /// Retry policy for `stage`.
    pub fn retry(&self, stage: Stage) -> RetryPolicy {
        match stage {
            Stage::Script => self.script_retry,
            Stage::Image => self.image_retry,
            Stage::Audio => self.audio_retry,
            Stage::Assembly => self.assembly_retry,
        }
    }

    /// Apply the same retry policy to every stage.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.script_retry = policy;
        self.image_retry = policy;
        self.audio_retry = policy;
        self.assembly_retry = policy;
        self
    }
}
