//! Job orchestration.
//!
//! The orchestrator owns a job from `Pending` to a terminal status:
//!
//! ```text
//! Pending ──▶ GeneratingScript ──▶ GeneratingScenes ──▶ Assembling ──▶ Completed
//!    │             (topic only)          ▲
//!    └────────── fixed script / resume ──┘
//!
//! any non-terminal status ──▶ Failed
//! ```
//!
//! Backends are resolved when the stage that needs them begins. Stage and
//! scene failures come back as values; only this module decides whether the
//! job fails.

use crate::{
    BackendRegistry, NullReporter, OrchestratorSettings, SceneBackends,
    SceneContext, SceneFailure, SceneProcessor,
};
use reelweave_core::{
    BackendConfig, BackendKind, ErrorInfo, FailureKind, GenerationJob, JobId, JobInput,
    JobStatus, ProgressEventKind, Scene, SceneScript, ScenePolicy, Stage, check_contiguous,
    derive_title, segment_script, status_progress,
};
use reelweave_error::{
    CapabilityError, CapabilityErrorKind, ErrorClass, PipelineError, PipelineErrorKind,
    ReelweaveResult,
};
use reelweave_interface::{
    AssemblyRequest, ConfigStore, ImageGenerator, JobRepository, ProgressReporter,
    PromptRequest, ScriptRequest, Scripter, Speaker, VideoAssembler,
};
use reelweave_stage::{CancellationToken, ProgressEmitter, StageContext, StageRunner};
use reelweave_storage::AssetLayout;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

type RunningJobs = Mutex<HashMap<JobId, CancellationToken>>;

/// Per-run state shared by the stages of one job.
struct JobRun {
    emitter: Arc<ProgressEmitter>,
    cancel: CancellationToken,
}

/// Removes a job from the running set when its run ends, however it ends.
struct RunningGuard<'a> {
    running: &'a RunningJobs,
    id: JobId,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}

/// Drives generation jobs through script, scenes and assembly.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = PipelineOrchestrator::new(registry, Arc::new(config), settings)
///     .with_reporter(Arc::new(TracingReporter))
///     .with_repository(Arc::new(repository));
///
/// let job = GenerationJob::new(JobInput::Topic("habit of reading".into()), selection);
/// let finished = orchestrator.start(job).await?;
/// match finished.status() {
///     JobStatus::Completed => println!("{:?}", finished.video),
///     _ => println!("{}", finished.failure.unwrap()),
/// }
/// ```
pub struct PipelineOrchestrator {
    registry: Arc<BackendRegistry>,
    config: Arc<dyn ConfigStore>,
    settings: OrchestratorSettings,
    reporter: Arc<dyn ProgressReporter>,
    repository: Option<Arc<dyn JobRepository>>,
    layout: AssetLayout,
    running: RunningJobs,
}

impl PipelineOrchestrator {
    /// Orchestrator resolving backends from `registry` with configuration
    /// from `config`.
    pub fn new(
        registry: BackendRegistry,
        config: Arc<dyn ConfigStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        let layout = AssetLayout::new(settings.output_dir().clone());
        Self {
            registry: Arc::new(registry),
            config,
            settings,
            reporter: Arc::new(NullReporter),
            repository: None,
            layout,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Send progress events to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Save a job snapshot to `repository` on every status change.
    pub fn with_repository(mut self, repository: Arc<dyn JobRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Settings in force.
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// The backend registry.
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Asset layout under the output directory.
    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    /// Whether `job_id` is currently running.
    pub fn is_running(&self, job_id: JobId) -> bool {
        self.lock_running().contains_key(&job_id)
    }

    /// Request cancellation of a running job.
    ///
    /// The token is checked between stages and before each scene task
    /// starts, and ends any pending retry backoff; backend calls already in
    /// flight are allowed to finish. Returns false
    /// if the job is not running.
    #[instrument(skip(self))]
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.lock_running().get(&job_id) {
            Some(token) => {
                info!("Cancellation requested");
                token.cancel();
                true
            }
            None => {
                debug!("Cancellation requested for a job that is not running");
                false
            }
        }
    }

    /// Run `job` to a terminal status.
    ///
    /// Returns the job as `Completed` or `Failed`; a failed job carries the
    /// originating error in `failure` and keeps every scene asset produced so
    /// far.
    ///
    /// # Errors
    ///
    /// Only when the job cannot be started: it is not `Pending`, or a job
    /// with the same id is already running.
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub async fn start(&self, mut job: GenerationJob) -> ReelweaveResult<GenerationJob> {
        if job.status() != JobStatus::Pending {
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: job.status().to_string(),
                to: JobStatus::GeneratingScript.to_string(),
            })
            .into());
        }

        let cancel = CancellationToken::new();
        let _guard = self.track(job.id, cancel.clone())?;
        let run = JobRun {
            emitter: Arc::new(ProgressEmitter::new(job.id, self.reporter.clone())),
            cancel,
        };

        info!(input = ?job.input, "Starting job");
        self.save(&job).await;

        match self.drive(&mut job, &run).await {
            Ok(()) => info!(video = ?job.video.as_ref().map(|v| &v.path), "Job completed"),
            Err(failure) => self.fail(&mut job, failure, &run).await,
        }
        Ok(job)
    }

    /// Start a new job that reuses the script and assets of a failed one.
    ///
    /// Script generation is skipped and only missing scene assets and the
    /// assembly are produced.
    pub async fn resume(&self, failed: &GenerationJob) -> ReelweaveResult<GenerationJob> {
        let job = GenerationJob::resume_from(failed)?;
        info!(failed_job = %failed.id, job_id = %job.id, "Resuming failed job");
        self.start(job).await
    }

    /// Load a failed job from the repository and resume it.
    pub async fn resume_by_id(&self, job_id: JobId) -> ReelweaveResult<GenerationJob> {
        let repository = self.repository.as_ref().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::JobNotFound(job_id.to_string()))
        })?;
        let failed = repository.load(job_id).await?;
        self.resume(&failed).await
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, CancellationToken>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn track(&self, id: JobId, cancel: CancellationToken) -> ReelweaveResult<RunningGuard<'_>> {
        let mut running = self.lock_running();
        if running.contains_key(&id) {
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: "running".to_string(),
                to: JobStatus::GeneratingScript.to_string(),
            })
            .into());
        }
        running.insert(id, cancel);
        Ok(RunningGuard {
            running: &self.running,
            id,
        })
    }

    async fn drive(&self, job: &mut GenerationJob, run: &JobRun) -> Result<(), ErrorInfo> {
        self.layout
            .prepare(job.id)
            .await
            .map_err(|e| ErrorInfo::from_error(&e, e.class()))?;

        self.prepare_scenes(job, run).await?;
        self.generate_scenes(job, run).await?;
        self.assemble(job, run).await
    }

    async fn prepare_scenes(&self, job: &mut GenerationJob, run: &JobRun) -> Result<(), ErrorInfo> {
        if !job.scenes.is_empty() {
            check_contiguous(&job.scenes).map_err(|position| {
                ErrorInfo::classified(
                    ErrorClass::Permanent,
                    PipelineErrorKind::NonContiguousScenes(format!(
                        "scene at position {} has index {}",
                        position, job.scenes[position].index
                    ))
                    .to_string(),
                )
            })?;
            let detail = format!(
                "Resuming with {} of {} scenes complete",
                job.completed_scenes().count(),
                job.scenes.len()
            );
            return self.advance(job, JobStatus::GeneratingScenes, detail, run).await;
        }

        let scripter = self.scripter(job);
        let script = match job.input.clone() {
            JobInput::FixedScript(text) => {
                let rule = *self.settings.segmentation();
                match &scripter {
                    Ok(scripter) => scripter.segment(&text, rule),
                    Err(e) => {
                        debug!(error = %e, "No scripter available, using built-in segmentation");
                        segment_script(&text, rule)
                    }
                }
            }
            JobInput::Topic(topic) => {
                self.advance(
                    job,
                    JobStatus::GeneratingScript,
                    format!("Writing script about '{}'", topic.trim()),
                    run,
                )
                .await?;
                self.check_cancel(run)?;
                let scripter = scripter
                    .as_ref()
                    .map_err(|e| ErrorInfo::from_error(e, e.class()).in_stage(Stage::Script))?;
                self.generate_script(job, scripter.as_ref(), &topic, run).await?
            }
        };

        if script.is_empty() {
            return Err(ErrorInfo::classified(
                ErrorClass::Permanent,
                PipelineErrorKind::EmptyScript(job.id.to_string()).to_string(),
            )
            .in_stage(Stage::Script));
        }
        if job.title.is_none() {
            job.title = script.title.clone();
        }
        job.scenes = script.into_scenes();

        if let Ok(scripter) = &scripter {
            self.check_cancel(run)?;
            self.write_image_prompts(job, scripter.as_ref(), run).await?;
            if job.title.is_none() {
                job.title = self.write_title(job, scripter.as_ref(), run).await;
            }
        }

        let detail = format!("Script ready with {} scenes", job.scenes.len());
        self.advance(job, JobStatus::GeneratingScenes, detail, run).await
    }

    fn scripter(&self, job: &GenerationJob) -> ReelweaveResult<Arc<dyn Scripter>> {
        self.backend_config(job, BackendKind::Scripter)
            .and_then(|config| self.registry.resolve_scripter(config.backend(), &config))
    }

    async fn generate_script(
        &self,
        job: &GenerationJob,
        scripter: &dyn Scripter,
        topic: &str,
        run: &JobRun,
    ) -> Result<SceneScript, ErrorInfo> {
        let settings = &job.selection.script;
        let request = ScriptRequest {
            job_id: job.id,
            topic: topic.trim().to_string(),
            scene_count: settings.scene_count,
            min_words: settings.min_words,
            max_words: settings.max_words,
        };
        StageRunner::new(self.settings.retry(Stage::Script))
            .run(
                StageContext::job(&run.emitter, Stage::Script).with_cancel(&run.cancel),
                |e| scripter.classify(e),
                || scripter.generate(&request),
            )
            .await
            .into_result()
    }

    /// Fill in image prompts for scenes that have none, asking the scripter
    /// for `prompt_batch_size` narrations at a time.
    ///
    /// A scripter that does not write prompts leaves the scenes to be
    /// illustrated from their narration. A batch answered with the wrong
    /// number of prompts is retried like any transient failure.
    async fn write_image_prompts(
        &self,
        job: &mut GenerationJob,
        scripter: &dyn Scripter,
        run: &JobRun,
    ) -> Result<(), ErrorInfo> {
        let pending: Vec<usize> = job
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, scene)| scene.image_prompt.is_none())
            .map(|(position, _)| position)
            .collect();
        let min_words = job.selection.render.prompt_min_words;
        let max_words = job.selection.render.prompt_max_words;
        let runner = StageRunner::new(self.settings.retry(Stage::Script));

        for batch in pending.chunks((*self.settings.prompt_batch_size()).max(1)) {
            let request = PromptRequest {
                job_id: job.id,
                narrations: batch
                    .iter()
                    .map(|&position| job.scenes[position].narration.clone())
                    .collect(),
                min_words,
                max_words,
            };
            let request = &request;
            let prompts = runner
                .run(
                    StageContext::job(&run.emitter, Stage::Script).with_cancel(&run.cancel),
                    |e| match e.capability_kind() {
                        Some(CapabilityErrorKind::MalformedResponse(_)) => ErrorClass::Transient,
                        _ => scripter.classify(e),
                    },
                    || async move {
                        let prompts = scripter.image_prompts(request).await?;
                        check_prompt_count(prompts, request.narrations.len())
                    },
                )
                .await
                .into_result()?;

            let Some(prompts) = prompts else {
                debug!("Scripter writes no image prompts, illustrating narration");
                return Ok(());
            };
            for (&position, prompt) in batch.iter().zip(prompts) {
                let prompt = prompt.trim();
                if !prompt.is_empty() {
                    job.scenes[position].image_prompt = Some(prompt.to_string());
                }
            }
            debug!(scenes = batch.len(), "Image prompts written");
        }
        Ok(())
    }

    /// Ask the scripter to title the job.
    ///
    /// A failed or empty answer leaves the title to be derived from the input.
    async fn write_title(
        &self,
        job: &GenerationJob,
        scripter: &dyn Scripter,
        run: &JobRun,
    ) -> Option<String> {
        let content = match &job.input {
            JobInput::Topic(topic) => topic.trim(),
            JobInput::FixedScript(script) => script.as_str(),
        };
        let max_chars = *self.settings.title_max_chars();

        let outcome = StageRunner::new(self.settings.retry(Stage::Script))
            .run(
                StageContext::job(&run.emitter, Stage::Script).with_cancel(&run.cancel),
                |e| scripter.classify(e),
                || scripter.title(content),
            )
            .await
            .into_result();

        match outcome {
            Ok(title) => title
                .map(|title| derive_title(title.trim().trim_matches(['"', '\'']), max_chars))
                .filter(|title| !title.is_empty()),
            Err(failure) => {
                warn!(error = %failure, "Title generation failed, deriving title from input");
                None
            }
        }
    }

    async fn generate_scenes(&self, job: &mut GenerationJob, run: &JobRun) -> Result<(), ErrorInfo> {
        self.check_cancel(run)?;

        let needs_image = job.scenes.iter().any(Scene::needs_image);
        let needs_audio = job.scenes.iter().any(Scene::needs_audio);
        if !needs_image && !needs_audio {
            debug!("Every scene already has its assets");
            return Ok(());
        }

        let backends = SceneBackends {
            image: if needs_image {
                Some(self.image_backend(job)?)
            } else {
                None
            },
            speaker: if needs_audio {
                Some(self.speaker_backend(job)?)
            } else {
                None
            },
        };

        let total = job.scenes.len();
        let (done, todo): (Vec<Scene>, Vec<Scene>) = std::mem::take(&mut job.scenes)
            .into_iter()
            .partition(Scene::is_complete);

        let processor = SceneProcessor::new(
            *self.settings.concurrency(),
            StageRunner::new(self.settings.retry(Stage::Image)),
            StageRunner::new(self.settings.retry(Stage::Audio)),
        );
        let context = SceneContext {
            job_id: job.id,
            selection: Arc::new(job.selection.clone()),
            layout: self.layout.clone(),
            emitter: run.emitter.clone(),
            cancel: run.cancel.clone(),
            backends,
        };
        let batch = processor.process(todo, total, context).await;

        let cancelled = batch.cancelled;
        let failures = batch.failed.clone();
        let mut scenes = done;
        scenes.extend(batch.into_scenes());
        scenes.sort_by_key(|scene| scene.index);
        job.scenes = scenes;

        if cancelled {
            return Err(cancelled_info(job.id));
        }
        if failures.is_empty() {
            return Ok(());
        }

        match self.settings.scene_policy() {
            ScenePolicy::Fatal => Err(scene_failure_info(&failures, total)),
            ScenePolicy::BestEffort => {
                if job.completed_scenes().next().is_none() {
                    return Err(scene_failure_info(&failures, total)
                        .with_kind(FailureKind::PartialSceneFailure));
                }
                job.omitted_scenes = failures.iter().map(SceneFailure::index).collect();
                warn!(
                    omitted = ?job.omitted_scenes,
                    "Continuing without failed scenes"
                );
                Ok(())
            }
        }
    }

    fn image_backend(&self, job: &GenerationJob) -> Result<Arc<dyn ImageGenerator>, ErrorInfo> {
        self.backend_config(job, BackendKind::Image)
            .and_then(|config| self.registry.resolve_image(config.backend(), &config))
            .map_err(|e| ErrorInfo::from_error(&e, e.class()).in_stage(Stage::Image))
    }

    fn speaker_backend(&self, job: &GenerationJob) -> Result<Arc<dyn Speaker>, ErrorInfo> {
        self.backend_config(job, BackendKind::Speaker)
            .and_then(|config| self.registry.resolve_speaker(config.backend(), &config))
            .map_err(|e| ErrorInfo::from_error(&e, e.class()).in_stage(Stage::Audio))
    }

    async fn assemble(&self, job: &mut GenerationJob, run: &JobRun) -> Result<(), ErrorInfo> {
        self.check_cancel(run)?;

        let scenes: Vec<Scene> = job.completed_scenes().cloned().collect();
        self.advance(
            job,
            JobStatus::Assembling,
            format!("Assembling {} scenes", scenes.len()),
            run,
        )
        .await?;

        let assembler: Arc<dyn VideoAssembler> = self
            .backend_config(job, BackendKind::Assembler)
            .and_then(|config| self.registry.resolve_assembler(config.backend(), &config))
            .map_err(|e| ErrorInfo::from_error(&e, e.class()).in_stage(Stage::Assembly))?;

        let settings = &job.selection.assembly;
        let request = AssemblyRequest {
            job_id: job.id,
            title: job.effective_title(*self.settings.title_max_chars()),
            scenes,
            bgm: settings.bgm.clone(),
            template: settings.template.clone(),
            width: settings.width,
            height: settings.height,
            fps: settings.fps,
            target: self.layout.final_video(job.id),
        };

        let video = StageRunner::new(self.settings.retry(Stage::Assembly))
            .run(
                StageContext::job(&run.emitter, Stage::Assembly).with_cancel(&run.cancel),
                |e| assembler.classify(e),
                || assembler.compose(&request),
            )
            .await
            .into_result()
            .map_err(|failure| failure.with_kind(FailureKind::Assembly))?;

        let detail = format!("Video ready at {}", video.path.display());
        job.video = Some(video);
        self.advance(job, JobStatus::Completed, detail, run).await
    }

    /// Backend configuration for `kind`, with the job's backend choice applied.
    fn backend_config(
        &self,
        job: &GenerationJob,
        kind: BackendKind,
    ) -> ReelweaveResult<BackendConfig> {
        let stored = self.config.backend_config(kind);
        match (stored, job.selection.backend_override(kind)) {
            (Ok(config), None) => Ok(config),
            (Ok(config), Some(name)) => Ok(config.with_backend(name)),
            (Err(_), Some(name)) => Ok(BackendConfig::new(name)),
            (Err(e), None) => Err(e),
        }
    }

    fn check_cancel(&self, run: &JobRun) -> Result<(), ErrorInfo> {
        if run.cancel.is_cancelled() {
            return Err(cancelled_info(run.emitter.job_id()));
        }
        Ok(())
    }

    async fn advance(
        &self,
        job: &mut GenerationJob,
        next: JobStatus,
        detail: String,
        run: &JobRun,
    ) -> Result<(), ErrorInfo> {
        let from = job
            .transition_to(next)
            .map_err(|e| ErrorInfo::classified(ErrorClass::Permanent, e.to_string()))?;
        info!(from = %from, to = %next, "{}", detail);
        run.emitter.emit_at(
            status_progress(next),
            ProgressEventKind::Transition {
                from,
                to: next,
                detail,
            },
        );
        self.save(job).await;
        Ok(())
    }

    async fn fail(&self, job: &mut GenerationJob, failure: ErrorInfo, run: &JobRun) {
        warn!(kind = %failure.kind, error = %failure, "Job failed");
        let detail = failure.to_string();
        job.failure = Some(failure);
        match job.transition_to(JobStatus::Failed) {
            Ok(from) => run.emitter.emit(ProgressEventKind::Transition {
                from,
                to: JobStatus::Failed,
                detail,
            }),
            Err(e) => warn!(error = %e, "Could not mark job as failed"),
        }
        self.save(job).await;
    }

    async fn save(&self, job: &GenerationJob) {
        let Some(repository) = &self.repository else {
            return;
        };
        if let Err(e) = repository.save(job).await {
            warn!(error = %e, "Failed to save job snapshot");
        }
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("layout", &self.layout)
            .field("has_repository", &self.repository.is_some())
            .finish_non_exhaustive()
    }
}

fn check_prompt_count(
    prompts: Option<Vec<String>>,
    expected: usize,
) -> ReelweaveResult<Option<Vec<String>>> {
    match prompts {
        Some(prompts) if prompts.len() != expected => {
            Err(CapabilityError::new(CapabilityErrorKind::MalformedResponse(format!(
                "expected {} image prompts, got {}",
                expected,
                prompts.len()
            )))
            .into())
        }
        other => Ok(other),
    }
}

fn cancelled_info(job_id: JobId) -> ErrorInfo {
    ErrorInfo::new(
        FailureKind::Cancelled,
        PipelineErrorKind::Cancelled(job_id.to_string()).to_string(),
    )
}

/// Failure for a job whose scenes did not all complete.
///
/// The kind follows the lowest-index failed scene; every failed index is
/// listed.
fn scene_failure_info(failures: &[SceneFailure], total: usize) -> ErrorInfo {
    let indices: Vec<usize> = failures.iter().map(SceneFailure::index).collect();
    let first = failures.first();
    let primary = first.and_then(SceneFailure::primary_error);
    let summary = format!("{} of {} scenes failed", failures.len(), total);

    let mut info = match primary {
        Some(primary) => ErrorInfo {
            message: format!("{}: {}", summary, primary.message),
            ..primary.clone()
        },
        None => ErrorInfo::new(FailureKind::PartialSceneFailure, summary),
    };
    if let Some(first) = first {
        info.scene_index = Some(first.index());
    }
    info.failed_scenes = indices;
    info
}
