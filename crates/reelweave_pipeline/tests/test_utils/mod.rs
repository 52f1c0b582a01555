//! Mock backends and helpers for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reelweave_core::{
    AudioAsset, BackendConfig, BackendKind, BackendSelection, GenerationJob, ImageAsset, JobInput,
    ProgressEvent, Scene, SceneScript, VideoAsset,
};
use reelweave_error::{CapabilityError, CapabilityErrorKind, ReelweaveResult};
use reelweave_interface::{
    AssemblyRequest, Backend, ConfigStore, ImageGenerator, ImageRequest, PromptRequest,
    ScriptRequest, Scripter, SpeechOutput, SpeechRequest, Speaker, VideoAssembler,
};
use reelweave_pipeline::{BackendRegistry, OrchestratorSettings};
use reelweave_stage::RetryPolicy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// How a mock answers one scene.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeed
    Succeed,
    /// Always fail with the error
    Fail(CapabilityErrorKind),
    /// Fail the first N calls, then succeed
    FailTimes(usize, CapabilityErrorKind),
}

/// Records calls made to a per-scene mock.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl CallLog {
    /// Scene indices in call order, one entry per attempt.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of attempts made for `index`.
    pub fn attempts(&self, index: usize) -> usize {
        self.calls().iter().filter(|i| **i == index).count()
    }

    /// Distinct scenes that were called at least once, sorted.
    pub fn scenes(&self) -> Vec<usize> {
        let mut scenes = self.calls();
        scenes.sort_unstable();
        scenes.dedup();
        scenes
    }

    /// Highest number of overlapping calls seen.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Shared behavior of the image and speech mocks.
#[derive(Debug, Clone)]
pub struct SceneMock {
    behaviors: HashMap<usize, MockBehavior>,
    delays: HashMap<usize, Duration>,
    default_delay: Duration,
    log: Arc<CallLog>,
}

impl Default for SceneMock {
    fn default() -> Self {
        Self {
            behaviors: HashMap::new(),
            delays: HashMap::new(),
            default_delay: Duration::from_millis(10),
            log: Arc::new(CallLog::default()),
        }
    }
}

impl SceneMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(mut self, index: usize, behavior: MockBehavior) -> Self {
        self.behaviors.insert(index, behavior);
        self
    }

    pub fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn log(&self) -> Arc<CallLog> {
        self.log.clone()
    }

    async fn call(&self, index: usize) -> ReelweaveResult<()> {
        let previous = {
            let mut calls = self.log.calls.lock().unwrap();
            let previous = calls.iter().filter(|i| **i == index).count();
            calls.push(index);
            previous
        };
        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(&index).copied().unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.behaviors.get(&index).unwrap_or(&MockBehavior::Succeed) {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::Fail(kind) => Err(CapabilityError::new(kind.clone()).into()),
            MockBehavior::FailTimes(times, kind) if previous < *times => {
                Err(CapabilityError::new(kind.clone()).into())
            }
            MockBehavior::FailTimes(..) => Ok(()),
        }
    }
}

/// Image generator answering per scene.
#[derive(Debug, Clone, Default)]
pub struct MockImage(pub SceneMock);

impl Backend for MockImage {
    fn name(&self) -> &str {
        "mock-image"
    }
}

#[async_trait]
impl ImageGenerator for MockImage {
    async fn render(&self, request: &ImageRequest) -> ReelweaveResult<ImageAsset> {
        self.0.call(request.scene_index).await?;
        Ok(ImageAsset {
            width: Some(request.width),
            height: Some(request.height),
            ..ImageAsset::new(&request.target)
        })
    }
}

/// Speaker answering per scene; every clip lasts two seconds.
#[derive(Debug, Clone, Default)]
pub struct MockSpeaker(pub SceneMock);

impl Backend for MockSpeaker {
    fn name(&self) -> &str {
        "mock-speaker"
    }
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn synthesize(&self, request: &SpeechRequest) -> ReelweaveResult<SpeechOutput> {
        self.0.call(request.scene_index).await?;
        Ok(SpeechOutput::new(AudioAsset::new(&request.target), 2.0))
    }
}

/// Scripter writing `scene_count` numbered sentences.
///
/// Image prompts and titles are only written when enabled.
#[derive(Debug, Clone, Default)]
pub struct MockScripter {
    failure: Option<CapabilityErrorKind>,
    calls: Arc<AtomicUsize>,
    prompts: bool,
    short_first_batch: bool,
    prompt_batches: Arc<Mutex<Vec<usize>>>,
    title: Option<String>,
}

impl MockScripter {
    pub fn failing(kind: CapabilityErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Write "Illustration of: <narration>" for every scene.
    pub fn with_prompts(mut self) -> Self {
        self.prompts = true;
        self
    }

    /// Answer the first prompt batch with one prompt too few.
    pub fn short_first_batch(mut self) -> Self {
        self.short_first_batch = true;
        self
    }

    /// Answer title requests with `title`.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of narrations in each prompt request, in call order.
    pub fn prompt_batches(&self) -> Vec<usize> {
        self.prompt_batches.lock().unwrap().clone()
    }
}

impl Backend for MockScripter {
    fn name(&self) -> &str {
        "mock-scripter"
    }
}

#[async_trait]
impl Scripter for MockScripter {
    async fn generate(&self, request: &ScriptRequest) -> ReelweaveResult<SceneScript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = &self.failure {
            return Err(CapabilityError::new(kind.clone()).into());
        }
        let mut script = SceneScript::from_narrations(
            (0..request.scene_count).map(|i| format!("Sentence {} about {}.", i, request.topic)),
        );
        script.title = Some(format!("All about {}", request.topic));
        Ok(script)
    }

    async fn image_prompts(&self, request: &PromptRequest) -> ReelweaveResult<Option<Vec<String>>> {
        if !self.prompts {
            return Ok(None);
        }
        let first = {
            let mut batches = self.prompt_batches.lock().unwrap();
            batches.push(request.narrations.len());
            batches.len() == 1
        };
        let mut prompts: Vec<String> = request
            .narrations
            .iter()
            .map(|narration| format!("Illustration of: {}", narration))
            .collect();
        if first && self.short_first_batch {
            prompts.pop();
        }
        Ok(Some(prompts))
    }

    async fn title(&self, _content: &str) -> ReelweaveResult<Option<String>> {
        Ok(self.title.clone())
    }
}

/// Assembler that records what it was asked to compose.
#[derive(Debug, Clone, Default)]
pub struct MockAssembler {
    failure: Option<CapabilityErrorKind>,
    fail_times: Option<usize>,
    requests: Arc<Mutex<Vec<AssemblyRequest>>>,
}

impl MockAssembler {
    pub fn failing(kind: CapabilityErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Fail the first `times` compositions, then succeed.
    pub fn failing_times(times: usize, kind: CapabilityErrorKind) -> Self {
        Self {
            failure: Some(kind),
            fail_times: Some(times),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<AssemblyRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Scene indices of the most recent composition.
    pub fn last_scene_order(&self) -> Option<Vec<usize>> {
        self.requests()
            .last()
            .map(|request| request.scenes.iter().map(|scene| scene.index).collect())
    }
}

impl Backend for MockAssembler {
    fn name(&self) -> &str {
        "mock-assembler"
    }
}

#[async_trait]
impl VideoAssembler for MockAssembler {
    async fn compose(&self, request: &AssemblyRequest) -> ReelweaveResult<VideoAsset> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some(kind) = &self.failure {
            if self.fail_times.map_or(true, |times| call <= times) {
                return Err(CapabilityError::new(kind.clone()).into());
            }
        }
        Ok(VideoAsset {
            duration_seconds: Some(request.narration_seconds()),
            ..VideoAsset::new(&request.target)
        })
    }
}

/// One mock of each kind.
#[derive(Debug, Clone, Default)]
pub struct Mocks {
    pub scripter: MockScripter,
    pub image: MockImage,
    pub speaker: MockSpeaker,
    pub assembler: MockAssembler,
}

impl Mocks {
    /// Registry with every mock registered as "mock".
    pub fn registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        let scripter = self.scripter.clone();
        registry.register_scripter("mock", move |_| Ok(Arc::new(scripter.clone())));
        let image = self.image.clone();
        registry.register_image("mock", move |_| Ok(Arc::new(image.clone())));
        let speaker = self.speaker.clone();
        registry.register_speaker("mock", move |_| Ok(Arc::new(speaker.clone())));
        let assembler = self.assembler.clone();
        registry.register_assembler("mock", move |_| Ok(Arc::new(assembler.clone())));
        registry
    }
}

/// Configuration naming the "mock" backend for every kind.
pub fn mock_config() -> HashMap<BackendKind, BackendConfig> {
    [
        BackendKind::Scripter,
        BackendKind::Image,
        BackendKind::Speaker,
        BackendKind::Assembler,
    ]
    .into_iter()
    .map(|kind| (kind, BackendConfig::new("mock")))
    .collect()
}

/// Same as [`mock_config`], as a shared store.
pub fn mock_store() -> Arc<dyn ConfigStore> {
    Arc::new(mock_config())
}

/// Settings writing under `dir`, with fast deterministic retries.
pub fn settings(dir: &Path, concurrency: usize) -> OrchestratorSettings {
    OrchestratorSettings::builder()
        .concurrency(concurrency)
        .output_dir(dir)
        .build()
        .expect("settings")
        .with_retry(
            RetryPolicy::default()
                .with_delays(Duration::from_millis(100), Duration::from_millis(400))
                .without_jitter(),
        )
}

/// Topic job asking for `scenes` scenes.
pub fn topic_job(topic: &str, scenes: usize) -> GenerationJob {
    let mut selection = BackendSelection::default();
    selection.script.scene_count = scenes;
    GenerationJob::new(JobInput::Topic(topic.to_string()), selection)
}

/// Fixed-script job.
pub fn script_job(script: &str) -> GenerationJob {
    GenerationJob::new(
        JobInput::FixedScript(script.to_string()),
        BackendSelection::default(),
    )
}

/// Every event currently buffered in `receiver`.
pub fn drain(receiver: &mut mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Whether `scenes` all have both assets.
pub fn all_complete(scenes: &[Scene]) -> bool {
    scenes.iter().all(Scene::is_complete)
}
