//! Requests handed to capability backends.

use reelweave_core::{AudioAsset, BgmTrack, JobId, Scene};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input to [`Scripter::generate`](crate::Scripter::generate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRequest {
    /// Owning job
    pub job_id: JobId,
    /// Topic to write about
    pub topic: String,
    /// Requested number of scenes
    pub scene_count: usize,
    /// Lower bound on narration length per scene, in words
    pub min_words: u32,
    /// Upper bound on narration length per scene, in words
    pub max_words: u32,
}

/// Input to [`Scripter::image_prompts`](crate::Scripter::image_prompts).
///
/// One batch of narrations; the answer must hold one prompt per narration,
/// in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Owning job
    pub job_id: JobId,
    /// Narrations to illustrate
    pub narrations: Vec<String>,
    /// Lower bound on prompt length, in words
    pub min_words: u32,
    /// Upper bound on prompt length, in words
    pub max_words: u32,
}

/// Input to [`ImageGenerator::render`](crate::ImageGenerator::render).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Owning job
    pub job_id: JobId,
    /// Scene being illustrated
    pub scene_index: usize,
    /// Final prompt, style prefix included
    pub prompt: String,
    /// The scene's narration
    pub narration: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Workflow selector (local workflow or cloud preset)
    pub workflow: Option<String>,
    /// Where the image must be written
    pub target: PathBuf,
}

/// Input to [`Speaker::synthesize`](crate::Speaker::synthesize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Owning job
    pub job_id: JobId,
    /// Scene being narrated
    pub scene_index: usize,
    /// Text to speak
    pub text: String,
    /// Voice workflow selector
    pub workflow: Option<String>,
    /// Voice identifier
    pub voice: Option<String>,
    /// Speaking rate multiplier
    pub speed: Option<f32>,
    /// Reference clip for voice cloning
    pub reference_audio: Option<PathBuf>,
    /// Where the audio must be written
    pub target: PathBuf,
}

/// Result of [`Speaker::synthesize`](crate::Speaker::synthesize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOutput {
    /// The written audio
    pub asset: AudioAsset,
    /// Its duration
    pub duration_seconds: f64,
}

impl SpeechOutput {
    /// Pair an audio asset with its duration.
    pub fn new(asset: AudioAsset, duration_seconds: f64) -> Self {
        Self {
            asset,
            duration_seconds,
        }
    }
}

/// Input to [`VideoAssembler::compose`](crate::VideoAssembler::compose).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRequest {
    /// Owning job
    pub job_id: JobId,
    /// Title rendered into the template
    pub title: String,
    /// Complete scenes in index order
    pub scenes: Vec<Scene>,
    /// Optional background music
    pub bgm: Option<BgmTrack>,
    /// Frame template selector
    pub template: Option<String>,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
    /// Where the video must be written
    pub target: PathBuf,
}

impl AssemblyRequest {
    /// Sum of the scenes' narration durations, where known.
    pub fn narration_seconds(&self) -> f64 {
        self.scenes
            .iter()
            .filter_map(|scene| scene.audio_duration_seconds)
            .sum()
    }
}
