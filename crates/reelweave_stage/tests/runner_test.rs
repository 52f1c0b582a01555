use reelweave_core::{FailureKind, JobId, ProgressEvent, ProgressEventKind, Stage};
use reelweave_error::{
    CapabilityError, CapabilityErrorKind, ErrorClass, ReelweaveError, ReelweaveResult,
};
use reelweave_interface::ProgressReporter;
use reelweave_stage::{
    CancellationToken, ProgressEmitter, RetryPolicy, StageContext, StageRunner,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Collector(Mutex<Vec<ProgressEvent>>);

impl ProgressReporter for Collector {
    fn emit(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn emitter() -> (Arc<Collector>, ProgressEmitter) {
    let collector = Arc::new(Collector::default());
    let emitter = ProgressEmitter::new(JobId::new(), collector.clone());
    (collector, emitter)
}

fn runner(retries: usize) -> StageRunner {
    StageRunner::new(RetryPolicy::default().with_retries(retries).without_jitter())
}

fn network_error() -> ReelweaveError {
    CapabilityError::new(CapabilityErrorKind::Network("connection reset".into())).into()
}

fn rejected_error() -> ReelweaveError {
    CapabilityError::new(CapabilityErrorKind::Rejected("unsupported size".into())).into()
}

#[tokio::test(start_paused = true)]
async fn transient_failure_uses_whole_budget() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);

    let result = runner(2)
        .run(
            StageContext::scene(&emitter, Stage::Image, 1),
            |e| e.class(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network_error())
            },
        )
        .await;

    assert!(!result.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.retries(), 2);
    let error = result.error().unwrap();
    assert_eq!(error.kind, FailureKind::Transient);
    assert_eq!(error.stage, Some(Stage::Image));
    assert_eq!(error.scene_index, Some(1));
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_is_never_retried() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);

    let result = runner(5)
        .run(
            StageContext::job(&emitter, Stage::Script),
            |e| e.class(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(rejected_error())
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.retries(), 0);
    assert_eq!(result.error().unwrap().kind, FailureKind::Permanent);
}

#[tokio::test(start_paused = true)]
async fn config_failure_is_never_retried() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);

    let result = runner(5)
        .run(
            StageContext::job(&emitter, Stage::Assembly),
            |e| e.class(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), ReelweaveError>(
                    CapabilityError::new(CapabilityErrorKind::Unauthorized("bad key".into()))
                        .into(),
                )
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.error().unwrap().kind, FailureKind::Config);
}

#[tokio::test(start_paused = true)]
async fn backend_classifier_overrides_default() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);

    // A backend that reports throttling as a rejection
    let result = runner(2)
        .run(
            StageContext::job(&emitter, Stage::Script),
            |_| ErrorClass::Transient,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(rejected_error())
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!result.is_success());
}

#[tokio::test(start_paused = true)]
async fn recovers_after_one_transient_failure() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);

    let result = runner(2)
        .run(
            StageContext::job(&emitter, Stage::Assembly),
            |e| e.class(),
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(network_error())
                } else {
                    Ok("final.mp4")
                }
            },
        )
        .await;

    assert!(result.is_success());
    assert_eq!(result.value(), Some(&"final.mp4"));
    assert_eq!(result.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn backoff_doubles_between_attempts() {
    let (_, emitter) = emitter();
    let started = tokio::time::Instant::now();

    let result = runner(3)
        .run(
            StageContext::job(&emitter, Stage::Script),
            |e| e.class(),
            || async { Err::<(), _>(network_error()) },
        )
        .await;

    assert_eq!(result.attempts(), 4);
    // 1s + 2s + 4s
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(7), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(8), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn timeout_counts_as_transient() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);
    let runner = StageRunner::new(
        RetryPolicy::default()
            .with_retries(1)
            .with_timeout(Duration::from_secs(2))
            .without_jitter(),
    );

    let result: reelweave_core::StageResult<()> = runner
        .run(
            StageContext::scene(&emitter, Stage::Audio, 0),
            |e| e.class(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
                ReelweaveResult::Ok(())
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let error = result.error().unwrap();
    assert_eq!(error.kind, FailureKind::Transient);
    assert!(error.message.contains("Timed out after 2000 ms"));
}

#[tokio::test(start_paused = true)]
async fn timeout_is_transient_even_when_backend_says_permanent() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);
    let runner = StageRunner::new(
        RetryPolicy::default()
            .with_retries(2)
            .with_timeout(Duration::from_secs(2))
            .without_jitter(),
    );

    let result: reelweave_core::StageResult<()> = runner
        .run(
            StageContext::job(&emitter, Stage::Assembly),
            |_| ErrorClass::Permanent,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(60)).await;
                ReelweaveResult::Ok(())
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let error = result.error().unwrap();
    assert_eq!(error.kind, FailureKind::Transient);
    assert_eq!(error.class, Some(ErrorClass::Transient));
}

#[tokio::test(start_paused = true)]
async fn cancellation_cuts_backoff_short() {
    let (_, emitter) = emitter();
    let calls = AtomicU32::new(0);
    let token = CancellationToken::new();
    let runner = StageRunner::new(
        RetryPolicy::default()
            .with_retries(2)
            .with_delays(Duration::from_secs(60), Duration::from_secs(120))
            .without_jitter(),
    );

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let result = runner
        .run(
            StageContext::scene(&emitter, Stage::Image, 0).with_cancel(&token),
            |e| e.class(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network_error())
            },
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(result.error().unwrap().kind, FailureKind::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancellation_lets_call_in_flight_finish() {
    let (_, emitter) = emitter();
    let token = CancellationToken::new();
    let runner = StageRunner::new(RetryPolicy::default().with_retries(2).without_jitter());

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let result = runner
        .run(
            StageContext::job(&emitter, Stage::Assembly).with_cancel(&token),
            |e| e.class(),
            || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                ReelweaveResult::Ok("final.mp4")
            },
        )
        .await;

    assert!(token.is_cancelled());
    assert_eq!(result.value(), Some(&"final.mp4"));
}

#[tokio::test(start_paused = true)]
async fn every_attempt_is_reported_in_order() {
    let (collector, emitter) = emitter();

    runner(2)
        .run(
            StageContext::scene(&emitter, Stage::Image, 4),
            |e| e.class(),
            || async { Err::<(), _>(network_error()) },
        )
        .await;

    let events = collector.0.lock().unwrap();
    let attempts: Vec<u32> = events
        .iter()
        .filter_map(|event| match event.kind {
            ProgressEventKind::Attempt {
                stage: Stage::Image,
                scene_index: Some(4),
                attempt,
            } => Some(attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);

    let sequences: Vec<u64> = events.iter().map(|event| event.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}
