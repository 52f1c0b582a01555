//! References to generated media.
//!
//! Assets are addressed by path under the caller-supplied output directory.
//! The pipeline never reads asset contents; it only hands references from one
//! backend to the next.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The kinds of artifact a job produces.
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
pub enum AssetKind {
    /// Per-scene illustration
    Image,
    /// Per-scene narration audio
    Audio,
    /// Final assembled video
    Video,
}

impl AssetKind {
    /// Default file extension for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Image => "png",
            AssetKind::Audio => "mp3",
            AssetKind::Video => "mp4",
        }
    }
}

/// A generated scene illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Location of the image file
    pub path: PathBuf,
    /// Width in pixels, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageAsset {
    /// Reference an image without dimension metadata.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: None,
            height: None,
        }
    }
}

/// A synthesized narration clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// Location of the audio file
    pub path: PathBuf,
}

impl AudioAsset {
    /// Reference an audio clip.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// The finished video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Location of the video file
    pub path: PathBuf,
    /// Total duration, if the assembler reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl VideoAsset {
    /// Reference a video without duration metadata.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration_seconds: None,
        }
    }
}
