mod test_utils;

use reelweave_core::{
    BackendSelection, FailureKind, ImageAsset, JobId, ProgressEventKind, Scene, SceneScript,
    scene_progress,
};
use reelweave_error::CapabilityErrorKind;
use reelweave_pipeline::{
    ChannelReporter, NullReporter, SceneBackends, SceneContext, SceneProcessor,
};
use reelweave_stage::{CancellationToken, ProgressEmitter, RetryPolicy, StageRunner};
use reelweave_storage::AssetLayout;
use std::sync::Arc;
use std::time::Duration;
use test_utils::*;

fn scenes(count: usize) -> Vec<Scene> {
    SceneScript::from_narrations((0..count).map(|i| format!("Scene number {}.", i))).into_scenes()
}

fn processor(concurrency: usize) -> SceneProcessor {
    let runner = StageRunner::new(
        RetryPolicy::default()
            .with_delays(Duration::from_millis(50), Duration::from_millis(200))
            .without_jitter(),
    );
    SceneProcessor::new(concurrency, runner, runner)
}

fn context(
    mocks: &Mocks,
    emitter: Arc<ProgressEmitter>,
    cancel: CancellationToken,
    root: &std::path::Path,
) -> SceneContext {
    SceneContext {
        job_id: emitter.job_id(),
        selection: Arc::new(BackendSelection::default()),
        layout: AssetLayout::new(root),
        emitter,
        cancel,
        backends: SceneBackends {
            image: Some(Arc::new(mocks.image.clone())),
            speaker: Some(Arc::new(mocks.speaker.clone())),
        },
    }
}

fn quiet_emitter() -> Arc<ProgressEmitter> {
    Arc::new(ProgressEmitter::new(JobId::new(), Arc::new(NullReporter)))
}

#[tokio::test(start_paused = true)]
async fn failing_scene_does_not_stop_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks {
        image: MockImage(SceneMock::new().with_behavior(
            1,
            MockBehavior::Fail(CapabilityErrorKind::Rejected("bad prompt".into())),
        )),
        ..Mocks::default()
    };

    let batch = processor(2)
        .process(
            scenes(4),
            4,
            context(&mocks, quiet_emitter(), CancellationToken::new(), dir.path()),
        )
        .await;

    assert!(!batch.is_complete());
    assert!(!batch.cancelled);
    assert_eq!(
        batch.completed.iter().map(|s| s.index).collect::<Vec<_>>(),
        vec![0, 2, 3]
    );
    assert_eq!(batch.failed_indices(), vec![1]);
    let failure = &batch.failed[0];
    assert!(failure.scene.audio.is_some());
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(
        failure.primary_error().map(|e| e.kind),
        Some(FailureKind::Permanent)
    );
    assert_eq!(
        batch.into_scenes().iter().map(|s| s.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[tokio::test(start_paused = true)]
async fn both_halves_failing_are_both_reported() {
    let dir = tempfile::tempdir().unwrap();
    let rejected = MockBehavior::Fail(CapabilityErrorKind::Rejected("nope".into()));
    let mocks = Mocks {
        image: MockImage(SceneMock::new().with_behavior(0, rejected.clone())),
        speaker: MockSpeaker(SceneMock::new().with_behavior(0, rejected)),
        ..Mocks::default()
    };

    let batch = processor(1)
        .process(
            scenes(1),
            1,
            context(&mocks, quiet_emitter(), CancellationToken::new(), dir.path()),
        )
        .await;

    let failure = &batch.failed[0];
    assert_eq!(failure.errors.len(), 2);
    assert_eq!(failure.errors[0].stage, Some(reelweave_core::Stage::Image));
    assert_eq!(failure.errors[1].stage, Some(reelweave_core::Stage::Audio));
}

#[tokio::test(start_paused = true)]
async fn existing_assets_are_not_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks::default();
    let mut input = scenes(3);
    input[0].image = Some(ImageAsset::new("/existing/000_image.png"));
    input[1].image = Some(ImageAsset::new("/existing/001_image.png"));

    let batch = processor(3)
        .process(
            input,
            3,
            context(&mocks, quiet_emitter(), CancellationToken::new(), dir.path()),
        )
        .await;

    assert!(batch.is_complete());
    assert_eq!(mocks.image.0.log().calls(), vec![2]);
    assert_eq!(mocks.speaker.0.log().scenes(), vec![0, 1, 2]);
    assert_eq!(
        batch.completed[0].image.as_ref().map(|a| a.path.clone()),
        Some(std::path::PathBuf::from("/existing/000_image.png"))
    );
}

#[tokio::test(start_paused = true)]
async fn missing_backend_fails_scenes_without_calls() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks::default();
    let mut context = context(&mocks, quiet_emitter(), CancellationToken::new(), dir.path());
    context.backends.speaker = None;

    let batch = processor(2).process(scenes(2), 2, context).await;

    assert_eq!(batch.failed_indices(), vec![0, 1]);
    let error = batch.failed[0].primary_error().unwrap();
    assert_eq!(error.kind, FailureKind::Config);
    assert!(batch.failed[0].scene.image.is_some());
}

#[tokio::test(start_paused = true)]
async fn concurrency_limit_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks {
        image: MockImage(SceneMock::new().with_default_delay(Duration::from_millis(200))),
        ..Mocks::default()
    };

    let batch = processor(3)
        .process(
            scenes(10),
            10,
            context(&mocks, quiet_emitter(), CancellationToken::new(), dir.path()),
        )
        .await;

    assert!(batch.is_complete());
    assert_eq!(mocks.image.0.log().max_in_flight(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let batch = processor(2)
        .process(scenes(3), 3, context(&mocks, quiet_emitter(), cancel, dir.path()))
        .await;

    assert!(batch.cancelled);
    assert_eq!(batch.skipped.len(), 3);
    assert!(batch.completed.is_empty());
    assert!(mocks.image.0.log().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scene_events_pair_up() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks::default();
    let (reporter, mut receiver) = ChannelReporter::new(256);
    let emitter = Arc::new(ProgressEmitter::new(JobId::new(), Arc::new(reporter)));

    processor(2)
        .process(
            scenes(3),
            3,
            context(&mocks, emitter, CancellationToken::new(), dir.path()),
        )
        .await;

    let events = drain(&mut receiver);
    for index in 0..3 {
        let started = events.iter().position(|e| {
            matches!(e.kind, ProgressEventKind::SceneStarted { scene_index, .. } if scene_index == index)
        });
        let finished = events.iter().position(|e| {
            matches!(e.kind, ProgressEventKind::SceneFinished { scene_index, success: true, .. } if scene_index == index)
        });
        assert!(started.unwrap() < finished.unwrap());
    }
    let halves = events
        .iter()
        .filter(|e| matches!(e.kind, ProgressEventKind::SceneTaskFinished { .. }))
        .count();
    assert_eq!(halves, 6);
    assert_eq!(events.last().map(|e| e.progress), Some(0.85));
}

#[tokio::test(start_paused = true)]
async fn progress_counts_scenes_finished_before_this_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks::default();
    let (reporter, mut receiver) = ChannelReporter::new(256);
    let emitter = Arc::new(ProgressEmitter::new(JobId::new(), Arc::new(reporter)));

    // Scenes 0..3 of a five-scene job are already done
    let pending: Vec<Scene> = scenes(5).into_iter().skip(3).collect();
    processor(1)
        .process(
            pending,
            5,
            context(&mocks, emitter, CancellationToken::new(), dir.path()),
        )
        .await;

    let finished: Vec<f32> = drain(&mut receiver)
        .into_iter()
        .filter(|e| matches!(e.kind, ProgressEventKind::SceneFinished { .. }))
        .map(|e| e.progress)
        .collect();
    assert_eq!(finished, vec![scene_progress(4, 5), scene_progress(5, 5)]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_ends_retry_backoff() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = Mocks {
        image: MockImage(SceneMock::new().with_behavior(
            0,
            MockBehavior::FailTimes(10, CapabilityErrorKind::Network("reset".into())),
        )),
        ..Mocks::default()
    };
    let runner = StageRunner::new(
        RetryPolicy::default()
            .with_retries(5)
            .with_delays(Duration::from_secs(300), Duration::from_secs(600))
            .without_jitter(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let batch = SceneProcessor::new(1, runner, runner)
        .process(
            scenes(1),
            1,
            context(&mocks, quiet_emitter(), cancel, dir.path()),
        )
        .await;

    assert!(batch.cancelled);
    assert!(started.elapsed() < Duration::from_secs(300));
    assert_eq!(mocks.image.0.log().attempts(0), 1);
    assert_eq!(
        batch.failed[0].primary_error().map(|e| e.kind),
        Some(FailureKind::Cancelled)
    );
}
