//! Scenes and scene scripts.

use crate::{AudioAsset, ImageAsset};
use serde::{Deserialize, Serialize};

/// One narration segment with its generated image and audio.
///
/// The index is assigned once when the script is split into scenes and
/// defines render order. Asset fields are filled in by the image and audio
/// stages; a scene is complete once both are present.
///
/// # Examples
///
/// ```
/// use reelweave_core::{AudioAsset, ImageAsset, Scene};
///
/// let mut scene = Scene::new(0, "Reading widens the world.");
/// assert!(!scene.is_complete());
///
/// scene.image = Some(ImageAsset::new("out/job/scenes/00_image.png"));
/// scene.audio = Some(AudioAsset::new("out/job/scenes/00_audio.mp3"));
/// scene.audio_duration_seconds = Some(2.4);
/// assert!(scene.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Position in the video, contiguous from 0
    pub index: usize,
    /// Text spoken over this scene
    pub narration: String,
    /// Prompt for the illustration; the narration is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Generated illustration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAsset>,
    /// Generated narration audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioAsset>,
    /// Length of the narration audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_duration_seconds: Option<f64>,
}

impl Scene {
    /// Create a scene with no generated assets.
    pub fn new(index: usize, narration: impl Into<String>) -> Self {
        Self {
            index,
            narration: narration.into(),
            image_prompt: None,
            image: None,
            audio: None,
            audio_duration_seconds: None,
        }
    }

    /// Whether both the image and the audio have been generated.
    pub fn is_complete(&self) -> bool {
        self.image.is_some() && self.audio.is_some()
    }

    /// Whether the image stage still has work to do for this scene.
    pub fn needs_image(&self) -> bool {
        self.image.is_none()
    }

    /// Whether the audio stage still has work to do for this scene.
    pub fn needs_audio(&self) -> bool {
        self.audio.is_none()
    }

    /// The text the image generator should illustrate.
    pub fn visual_prompt(&self) -> &str {
        self.image_prompt.as_deref().unwrap_or(&self.narration)
    }
}

/// One segment of a generated or segmented script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSegment {
    /// Narration text
    pub narration: String,
    /// Optional dedicated image prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
}

impl ScriptSegment {
    /// A segment carrying narration only.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            narration: text.into(),
            image_prompt: None,
        }
    }
}

/// Ordered narration segments produced by script generation or segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneScript {
    /// Suggested title, if the scripter produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Segments in narration order
    pub segments: Vec<ScriptSegment>,
}

impl SceneScript {
    /// Build a script from plain narration strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelweave_core::SceneScript;
    ///
    /// let script = SceneScript::from_narrations(["First.", "Second."]);
    /// let scenes = script.into_scenes();
    /// assert_eq!(scenes[1].index, 1);
    /// assert_eq!(scenes[1].narration, "Second.");
    /// ```
    pub fn from_narrations<I, S>(narrations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            segments: narrations
                .into_iter()
                .map(ScriptSegment::narration)
                .collect(),
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the script has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Turn segments into scenes with indices contiguous from 0.
    pub fn into_scenes(self) -> Vec<Scene> {
        self.segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| Scene {
                image_prompt: segment.image_prompt,
                ..Scene::new(index, segment.narration)
            })
            .collect()
    }
}

/// Check that scene indices run 0, 1, 2, ... in order.
///
/// Returns the first offending position on failure.
pub fn check_contiguous(scenes: &[Scene]) -> Result<(), usize> {
    match scenes
        .iter()
        .enumerate()
        .find(|(position, scene)| scene.index != *position)
    {
        Some((position, _)) => Err(position),
        None => Ok(()),
    }
}
