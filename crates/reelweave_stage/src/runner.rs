//! Single-stage execution with retry, timeout and classification.

use crate::{ProgressEmitter, RetryPolicy};
use reelweave_core::{ErrorInfo, ProgressEventKind, Stage, StageResult};
use reelweave_error::{
    CapabilityError, CapabilityErrorKind, ErrorClass, PipelineError, PipelineErrorKind,
    ReelweaveError, ReelweaveResult,
};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::watch;
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Where a stage invocation belongs.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Emitter for the owning job
    pub emitter: &'a ProgressEmitter,
    /// Stage being run
    pub stage: Stage,
    /// Scene, for per-scene stages
    pub scene_index: Option<usize>,
    /// Cuts retry backoff short once cancelled
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> StageContext<'a> {
    /// Context for a job-wide stage.
    pub fn job(emitter: &'a ProgressEmitter, stage: Stage) -> Self {
        Self {
            emitter,
            stage,
            scene_index: None,
            cancel: None,
        }
    }

    /// Context for a per-scene stage.
    pub fn scene(emitter: &'a ProgressEmitter, stage: Stage, scene_index: usize) -> Self {
        Self {
            emitter,
            stage,
            scene_index: Some(scene_index),
            cancel: None,
        }
    }

    /// Stop retrying once `token` is cancelled.
    pub fn with_cancel(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[derive(Debug)]
struct Classified {
    error: ReelweaveError,
    class: ErrorClass,
}

/// Runs one backend operation under a [`RetryPolicy`].
///
/// Every attempt emits an [`ProgressEventKind::Attempt`] event. Each call is
/// bounded by the policy timeout; a call that exceeds it is a transient
/// failure. Transient failures are retried with exponential backoff until
/// the budget is spent, permanent and configuration failures return at once.
/// A timeout is always transient, whatever the backend classifier says.
///
/// With a cancellation token in the context, cancellation ends a pending
/// backoff immediately and no further attempt starts. A call already in
/// flight is never interrupted.
///
/// The runner never returns an error: the outcome is always a
/// [`StageResult`].
///
/// # Example
///
/// ```rust,ignore
/// let runner = StageRunner::new(policy);
/// let result = runner
///     .run(StageContext::job(&emitter, Stage::Script), |e| scripter.classify(e), || async {
///         scripter.generate(&request).await
///     })
///     .await;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StageRunner {
    policy: RetryPolicy,
}

impl StageRunner {
    /// Runner with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy in force.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, classifying failures with `classify`.
    #[instrument(
        skip_all,
        fields(
            job_id = %ctx.emitter.job_id(),
            stage = %ctx.stage,
            scene = ?ctx.scene_index,
        )
    )]
    pub async fn run<T, F, Fut, C>(
        &self,
        ctx: StageContext<'_>,
        classify: C,
        operation: F,
    ) -> StageResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ReelweaveResult<T>>,
        C: Fn(&ReelweaveError) -> ErrorClass,
    {
        let attempts = AtomicU32::new(0);
        let timeout = self.policy.timeout;
        let (in_call, mut idle) = watch::channel(false);

        let retry = Retry::spawn(self.policy.delays(), || async {
            if ctx.cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(RetryError::Permanent(cancelled(&ctx)));
            }
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            ctx.emitter.emit(ProgressEventKind::Attempt {
                stage: ctx.stage,
                scene_index: ctx.scene_index,
                attempt,
            });
            debug!(attempt, "Calling backend");

            in_call.send_replace(true);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, operation())
                    .await
                    .map_err(|_| Classified {
                        error: CapabilityError::new(CapabilityErrorKind::Timeout(
                            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        ))
                        .into(),
                        class: ErrorClass::Transient,
                    })
                    .and_then(|result| result.map_err(|error| classify_with(&classify, error))),
                None => operation()
                    .await
                    .map_err(|error| classify_with(&classify, error)),
            };
            in_call.send_replace(false);

            result.map_err(|failure| {
                if failure.class.is_retryable() {
                    warn!(attempt, error = %failure.error, "Transient failure, will retry if budget remains");
                    RetryError::Transient {
                        err: failure,
                        retry_after: None,
                    }
                } else {
                    warn!(attempt, class = %failure.class, error = %failure.error, "Failure is not retryable");
                    RetryError::Permanent(failure)
                }
            })
        });

        let outcome = match ctx.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    outcome = retry => outcome,
                    _ = async {
                        token.cancelled().await;
                        // Only abandon the retry loop between calls
                        let _ = idle.wait_for(|busy| !*busy).await;
                    } => {
                        debug!("Cancelled while waiting to retry");
                        Err(cancelled(&ctx))
                    }
                }
            }
            None => retry.await,
        };

        let attempts = attempts.load(Ordering::SeqCst);
        match outcome {
            Ok(value) => StageResult::succeeded(value, attempts),
            Err(Classified { error, class }) => {
                let mut info = ErrorInfo::from_error(&error, class).in_stage(ctx.stage);
                if let Some(index) = ctx.scene_index {
                    info = info.for_scene(index);
                }
                StageResult::failed(info, attempts)
            }
        }
    }
}

fn classify_with<C>(classify: &C, error: ReelweaveError) -> Classified
where
    C: Fn(&ReelweaveError) -> ErrorClass,
{
    let class = classify(&error);
    Classified { error, class }
}

fn cancelled(ctx: &StageContext<'_>) -> Classified {
    Classified {
        error: PipelineError::new(PipelineErrorKind::Cancelled(ctx.emitter.job_id().to_string()))
            .into(),
        class: ErrorClass::Permanent,
    }
}
