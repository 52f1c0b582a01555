//! Capability traits for pipeline backends.
//!
//! Each capability kind is a small trait; concrete engines (a local
//! node-graph server, a hosted API, an LLM provider, a media tool) implement
//! the one they provide and are registered by name. The orchestrator only
//! ever sees the trait object.

use crate::{
    AssemblyRequest, ImageRequest, PromptRequest, ScriptRequest, SpeechOutput, SpeechRequest,
};
use async_trait::async_trait;
use reelweave_core::{ImageAsset, SceneScript, SegmentationRule, VideoAsset, segment_script};
use reelweave_error::{ErrorClass, ReelweaveError, ReelweaveResult};

/// Behavior shared by every backend.
pub trait Backend: Send + Sync {
    /// Registered name (e.g., "comfyui", "openai", "ffmpeg").
    fn name(&self) -> &str;

    /// Classify a failure raised by this backend.
    ///
    /// The default follows [`ReelweaveError::class`]. Backends that know
    /// better (an API returning 400 for rate limiting, say) override it.
    fn classify(&self, error: &ReelweaveError) -> ErrorClass {
        error.class()
    }
}

/// Script generation.
#[async_trait]
pub trait Scripter: Backend {
    /// Write a scene script about `request.topic`.
    async fn generate(&self, request: &ScriptRequest) -> ReelweaveResult<SceneScript>;

    /// Split a fixed script into scenes without calling the model.
    fn segment(&self, script: &str, rule: SegmentationRule) -> SceneScript {
        segment_script(script, rule)
    }

    /// Write one image prompt per narration in `request`.
    ///
    /// `None` means this scripter does not write prompts and scenes are
    /// illustrated from their narration.
    async fn image_prompts(&self, _request: &PromptRequest) -> ReelweaveResult<Option<Vec<String>>> {
        Ok(None)
    }

    /// Write a title for `content` (a topic or a whole script).
    ///
    /// `None` leaves the title to be derived from the input.
    async fn title(&self, _content: &str) -> ReelweaveResult<Option<String>> {
        Ok(None)
    }
}

/// Per-scene image generation.
#[async_trait]
pub trait ImageGenerator: Backend {
    /// Render the illustration for one scene into `request.target`.
    async fn render(&self, request: &ImageRequest) -> ReelweaveResult<ImageAsset>;
}

/// Text-to-speech.
#[async_trait]
pub trait Speaker: Backend {
    /// Synthesize narration for one scene into `request.target`.
    async fn synthesize(&self, request: &SpeechRequest) -> ReelweaveResult<SpeechOutput>;
}

/// Final video composition.
///
/// Implementations that shell out to a media tool map a non-zero exit status
/// to [`CapabilityErrorKind::ProcessExit`](reelweave_error::CapabilityErrorKind::ProcessExit).
#[async_trait]
pub trait VideoAssembler: Backend {
    /// Compose the ordered scenes into one video at `request.target`.
    async fn compose(&self, request: &AssemblyRequest) -> ReelweaveResult<VideoAsset>;
}
