//! Retry policy.

use std::time::Duration;
use tokio_retry2::strategy::jitter;

/// Retry budget, backoff and timeout for one stage.
///
/// Only transient failures are retried. The delay before retry `n`
/// (counting from 0) is `base_delay * 2^n`, capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use reelweave_stage::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default().with_retries(5).without_jitter();
/// let delays = policy.delays();
///
/// assert_eq!(delays.len(), 5);
/// assert_eq!(delays[0], Duration::from_secs(1));
/// assert_eq!(delays[3], Duration::from_secs(8));
/// assert_eq!(delays[4], Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt for transient failures
    pub transient_retries: usize,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Per-attempt timeout; exceeding it counts as a transient failure
    pub timeout: Option<Duration>,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transient_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            timeout: None,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            transient_retries: 0,
            ..Self::default()
        }
    }

    /// Set the retry budget.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.transient_retries = retries;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set base and maximum delay.
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    /// Disable jitter, making delays exact.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// The delays slept between attempts, one per retry.
    pub fn delays(&self) -> Vec<Duration> {
        (0..self.transient_retries)
            .map(|n| {
                let factor = 2u32.saturating_pow(n.min(31) as u32);
                self.base_delay
                    .checked_mul(factor)
                    .map_or(self.max_delay, |delay| delay.min(self.max_delay))
            })
            .map(|delay| if self.jitter { jitter(delay) } else { delay })
            .collect()
    }
}
