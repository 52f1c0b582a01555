//! Per-scene fan-out.
//!
//! Each scene is one task that generates its image and its audio
//! concurrently. At most `concurrency` scene tasks run at once. A task owns
//! its scene outright and hands it back when done, so no scene is ever
//! written by two tasks and no locking is needed; results are merged after
//! every task has been joined.

use reelweave_core::{
    AssetKind, BackendSelection, ErrorInfo, ImageAsset, JobId, ProgressEventKind, Scene, Stage,
    StageResult, build_image_prompt, scene_progress,
};
use reelweave_error::ErrorClass;
use reelweave_interface::{ImageGenerator, ImageRequest, SpeechOutput, SpeechRequest, Speaker};
use reelweave_stage::{CancellationToken, ProgressEmitter, StageContext, StageRunner};
use reelweave_storage::AssetLayout;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Backends used by scene tasks. A missing backend fails every scene that
/// still needs that asset.
#[derive(Clone, Default)]
pub struct SceneBackends {
    /// Image generator
    pub image: Option<Arc<dyn ImageGenerator>>,
    /// Speaker
    pub speaker: Option<Arc<dyn Speaker>>,
}

impl std::fmt::Debug for SceneBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneBackends")
            .field("image", &self.image.as_ref().map(|b| b.name().to_string()))
            .field("speaker", &self.speaker.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}

/// Everything a scene task needs besides its scene.
#[derive(Debug, Clone)]
pub struct SceneContext {
    /// Owning job
    pub job_id: JobId,
    /// Render, voice and prompt settings
    pub selection: Arc<BackendSelection>,
    /// Where assets go
    pub layout: AssetLayout,
    /// Progress for the owning job
    pub emitter: Arc<ProgressEmitter>,
    /// Cancellation for the owning job
    pub cancel: CancellationToken,
    /// Backends
    pub backends: SceneBackends,
}

/// A scene that could not be completed.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFailure {
    /// The scene as far as it got; any asset that was produced is kept
    pub scene: Scene,
    /// What went wrong, image first
    pub errors: Vec<ErrorInfo>,
}

impl SceneFailure {
    /// Index of the failed scene.
    pub fn index(&self) -> usize {
        self.scene.index
    }

    /// The most informative error: the first one recorded.
    pub fn primary_error(&self) -> Option<&ErrorInfo> {
        self.errors.first()
    }
}

/// Outcome of processing a set of scenes.
///
/// Every input scene ends up in exactly one of `completed`, `failed` or
/// `skipped`, each sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBatch {
    /// Scenes with both assets
    pub completed: Vec<Scene>,
    /// Scenes that failed
    pub failed: Vec<SceneFailure>,
    /// Scenes never started because the job was cancelled
    pub skipped: Vec<Scene>,
    /// Whether cancellation was observed
    pub cancelled: bool,
}

impl SceneBatch {
    /// Indices of failed scenes.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(SceneFailure::index).collect()
    }

    /// Whether every scene completed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && !self.cancelled
    }

    /// All scenes, with whatever assets they have, in index order.
    pub fn into_scenes(self) -> Vec<Scene> {
        let mut scenes: Vec<Scene> = self
            .completed
            .into_iter()
            .chain(self.failed.into_iter().map(|failure| failure.scene))
            .chain(self.skipped)
            .collect();
        scenes.sort_by_key(|scene| scene.index);
        scenes
    }
}

enum SceneOutcome {
    Completed(Scene),
    Failed(SceneFailure),
}

struct SceneTask {
    context: SceneContext,
    image_runner: StageRunner,
    audio_runner: StageRunner,
    scene_total: usize,
    finished: Arc<AtomicUsize>,
}

/// Runs image and audio generation for a set of scenes with bounded
/// concurrency.
///
/// # Example
///
/// ```rust,ignore
/// let processor = SceneProcessor::new(3, image_runner, audio_runner);
/// let batch = processor.process(job.scenes.clone(), scene_count, context).await;
/// assert!(batch.is_complete());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SceneProcessor {
    concurrency: usize,
    image_runner: StageRunner,
    audio_runner: StageRunner,
}

impl SceneProcessor {
    /// Processor running at most `concurrency` scenes at once (minimum 1).
    pub fn new(concurrency: usize, image_runner: StageRunner, audio_runner: StageRunner) -> Self {
        Self {
            concurrency: concurrency.max(1),
            image_runner,
            audio_runner,
        }
    }

    /// The concurrency limit.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Generate missing assets for `scenes`.
    ///
    /// `scene_total` is the number of scenes in the whole job; scenes of the
    /// job not passed in count as already finished for progress. Existing
    /// assets are never regenerated. A failing
    /// scene does not stop its siblings. Once cancellation is observed no
    /// further scene task starts; tasks already running finish.
    #[instrument(skip_all, fields(job_id = %context.job_id, scenes = scenes.len(), concurrency = self.concurrency))]
    pub async fn process(
        &self,
        scenes: Vec<Scene>,
        scene_total: usize,
        context: SceneContext,
    ) -> SceneBatch {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let scene_total = scene_total.max(scenes.len());
        let task = Arc::new(SceneTask {
            context,
            image_runner: self.image_runner,
            audio_runner: self.audio_runner,
            scene_total,
            finished: Arc::new(AtomicUsize::new(scene_total - scenes.len())),
        });

        let mut batch = SceneBatch::default();
        let mut handles = Vec::with_capacity(scenes.len());
        let mut pending = scenes.into_iter();

        while let Some(scene) = pending.next() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    batch.skipped.push(scene);
                    continue;
                }
            };
            if task.context.cancel.is_cancelled() {
                info!(
                    next_scene = scene.index,
                    "Cancellation observed, not starting remaining scenes"
                );
                batch.cancelled = true;
                batch.skipped.push(scene);
                batch.skipped.extend(pending.by_ref());
                break;
            }

            let fallback = scene.clone();
            let task = task.clone();
            let handle = tokio::spawn(async move {
                let outcome = task.run(scene).await;
                drop(permit);
                outcome
            });
            handles.push((fallback, handle));
        }

        // Barrier: every started task is joined before anything is merged
        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(fallback, handle)| async move { (fallback, handle.await) }),
        )
        .await;

        for (fallback, result) in joined {
            match result {
                Ok(SceneOutcome::Completed(scene)) => batch.completed.push(scene),
                Ok(SceneOutcome::Failed(failure)) => batch.failed.push(failure),
                Err(join_error) => {
                    warn!(scene = fallback.index, error = %join_error, "Scene task aborted");
                    let info = ErrorInfo::classified(
                        ErrorClass::Permanent,
                        format!("scene task aborted: {}", join_error),
                    )
                    .for_scene(fallback.index);
                    batch.failed.push(SceneFailure {
                        scene: fallback,
                        errors: vec![info],
                    });
                }
            }
        }

        if task.context.cancel.is_cancelled() {
            batch.cancelled = true;
        }
        batch.completed.sort_by_key(|scene| scene.index);
        batch.failed.sort_by_key(SceneFailure::index);
        batch.skipped.sort_by_key(|scene| scene.index);

        debug!(
            completed = batch.completed.len(),
            failed = batch.failed.len(),
            skipped = batch.skipped.len(),
            "Scene batch finished"
        );
        batch
    }
}

impl SceneTask {
    async fn run(&self, mut scene: Scene) -> SceneOutcome {
        let index = scene.index;
        let emitter = &self.context.emitter;
        emitter.emit(ProgressEventKind::SceneStarted {
            scene_index: index,
            scene_total: self.scene_total,
        });

        let (image, audio) = tokio::join!(self.image(&scene), self.audio(&scene));

        let mut errors = Vec::new();
        if let Some(result) = image {
            self.task_finished(index, Stage::Image, result.is_success());
            match result.into_result() {
                Ok(asset) => scene.image = Some(asset),
                Err(info) => errors.push(info),
            }
        }
        if let Some(result) = audio {
            self.task_finished(index, Stage::Audio, result.is_success());
            match result.into_result() {
                Ok(output) => {
                    scene.audio = Some(output.asset);
                    scene.audio_duration_seconds = Some(output.duration_seconds);
                }
                Err(info) => errors.push(info),
            }
        }

        let success = errors.is_empty() && scene.is_complete();
        let finished = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
        emitter.emit_at(
            scene_progress(finished, self.scene_total),
            ProgressEventKind::SceneFinished {
                scene_index: index,
                scene_total: self.scene_total,
                success,
            },
        );

        if success {
            debug!(scene = index, "Scene complete");
            SceneOutcome::Completed(scene)
        } else {
            warn!(scene = index, errors = errors.len(), "Scene failed");
            SceneOutcome::Failed(SceneFailure { scene, errors })
        }
    }

    fn task_finished(&self, index: usize, stage: Stage, success: bool) {
        self.context.emitter.emit(ProgressEventKind::SceneTaskFinished {
            scene_index: index,
            scene_total: self.scene_total,
            stage,
            success,
        });
    }

    async fn image(&self, scene: &Scene) -> Option<StageResult<ImageAsset>> {
        if !scene.needs_image() {
            return None;
        }
        let Some(backend) = self.context.backends.image.as_ref() else {
            return Some(missing_backend(Stage::Image, scene.index));
        };
        let render = &self.context.selection.render;
        let request = ImageRequest {
            job_id: self.context.job_id,
            scene_index: scene.index,
            prompt: build_image_prompt(scene.visual_prompt(), render.style_prefix.as_deref()),
            narration: scene.narration.clone(),
            width: render.width,
            height: render.height,
            workflow: render.workflow.clone(),
            target: self
                .context
                .layout
                .scene_asset(self.context.job_id, scene.index, AssetKind::Image),
        };
        let result = self
            .image_runner
            .run(
                StageContext::scene(&self.context.emitter, Stage::Image, scene.index)
                    .with_cancel(&self.context.cancel),
                |e| backend.classify(e),
                || backend.render(&request),
            )
            .await;
        Some(result)
    }

    async fn audio(&self, scene: &Scene) -> Option<StageResult<SpeechOutput>> {
        if !scene.needs_audio() {
            return None;
        }
        let Some(backend) = self.context.backends.speaker.as_ref() else {
            return Some(missing_backend(Stage::Audio, scene.index));
        };
        let voice = &self.context.selection.voice;
        let request = SpeechRequest {
            job_id: self.context.job_id,
            scene_index: scene.index,
            text: scene.narration.clone(),
            workflow: voice.workflow.clone(),
            voice: voice.voice.clone(),
            speed: voice.speed,
            reference_audio: voice.reference_audio.clone(),
            target: self
                .context
                .layout
                .scene_asset(self.context.job_id, scene.index, AssetKind::Audio),
        };
        let result = self
            .audio_runner
            .run(
                StageContext::scene(&self.context.emitter, Stage::Audio, scene.index)
                    .with_cancel(&self.context.cancel),
                |e| backend.classify(e),
                || backend.synthesize(&request),
            )
            .await;
        Some(result)
    }
}

fn missing_backend<T>(stage: Stage, index: usize) -> StageResult<T> {
    StageResult::failed(
        ErrorInfo::classified(
            ErrorClass::Config,
            format!("no backend available for the {} stage", stage),
        )
        .in_stage(stage)
        .for_scene(index),
        0,
    )
}
