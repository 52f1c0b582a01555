//! Per-job backend selection and generation settings.

use crate::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Script generation parameters (topic mode only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSettings {
    /// Number of scenes to request from the scripter
    pub scene_count: usize,
    /// Lower bound on narration length, in words
    pub min_words: u32,
    /// Upper bound on narration length, in words
    pub max_words: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            scene_count: 5,
            min_words: 5,
            max_words: 20,
        }
    }
}

/// Image generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Style text prepended to every image prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_prefix: Option<String>,
    /// Workflow selector (local node-graph workflow or cloud preset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    /// Lower bound on scripter-written image prompts, in words
    #[serde(default = "default_prompt_min_words")]
    pub prompt_min_words: u32,
    /// Upper bound on scripter-written image prompts, in words
    #[serde(default = "default_prompt_max_words")]
    pub prompt_max_words: u32,
}

fn default_prompt_min_words() -> u32 {
    30
}

fn default_prompt_max_words() -> u32 {
    60
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            style_prefix: None,
            workflow: None,
            prompt_min_words: default_prompt_min_words(),
            prompt_max_words: default_prompt_max_words(),
        }
    }
}

/// Speech synthesis parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice workflow selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    /// Voice identifier understood by the speaker backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speaking rate multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Reference clip for voice cloning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_audio: Option<PathBuf>,
}

/// How background music is laid under the narration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BgmMode {
    /// Play once and stop
    Once,
    /// Loop until the video ends
    #[default]
    Loop,
}

/// Background music track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgmTrack {
    /// Audio file to mix in
    pub path: PathBuf,
    /// Mix volume in `0.0..=1.0`
    #[serde(default = "default_bgm_volume")]
    pub volume: f32,
    /// Playback mode
    #[serde(default)]
    pub mode: BgmMode,
}

fn default_bgm_volume() -> f32 {
    0.2
}

impl BgmTrack {
    /// A looping track at the default volume.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            volume: default_bgm_volume(),
            mode: BgmMode::default(),
        }
    }

    /// The volume clamped to `0.0..=1.0`.
    pub fn effective_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }
}

/// Video composition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblySettings {
    /// Frame template selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
    /// Optional background music
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm: Option<BgmTrack>,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            template: None,
            width: 1080,
            height: 1920,
            fps: 30,
            bgm: None,
        }
    }
}

/// Which backends a job uses and how they are parameterized.
///
/// Backend names left unset fall back to whatever the configuration store
/// selects for that capability kind.
///
/// # Examples
///
/// ```
/// use reelweave_core::{BackendKind, BackendSelection};
///
/// let selection = BackendSelection::builder()
///     .image("cloud-image")
///     .build()
///     .unwrap();
///
/// assert_eq!(selection.backend_override(BackendKind::Image), Some("cloud-image"));
/// assert_eq!(selection.backend_override(BackendKind::Speaker), None);
/// assert_eq!(selection.render.width, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_builder::Builder)]
#[builder(default, setter(into))]
pub struct BackendSelection {
    /// Scripter backend name override
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripter: Option<String>,
    /// Image backend name override
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Speaker backend name override
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Assembler backend name override
    #[builder(setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembler: Option<String>,
    /// Script generation settings
    #[serde(default)]
    pub script: ScriptSettings,
    /// Image generation settings
    #[serde(default)]
    pub render: RenderSettings,
    /// Speech settings
    #[serde(default)]
    pub voice: VoiceSettings,
    /// Composition settings
    #[serde(default)]
    pub assembly: AssemblySettings,
}

impl BackendSelection {
    /// Start building a selection.
    pub fn builder() -> BackendSelectionBuilder {
        BackendSelectionBuilder::default()
    }

    /// The backend name this job requests for `kind`, if any.
    pub fn backend_override(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::Scripter => self.scripter.as_deref(),
            BackendKind::Image => self.image.as_deref(),
            BackendKind::Speaker => self.speaker.as_deref(),
            BackendKind::Assembler => self.assembler.as_deref(),
        }
    }
}
