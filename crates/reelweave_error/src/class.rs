//! Failure classification used by the retry policy.

use serde::{Deserialize, Serialize};

/// How a failed backend call should be treated by the stage runner.
///
/// - `Transient` failures (network drops, timeouts, rate limits, 5xx) are
///   retried with exponential backoff up to the stage's retry budget.
/// - `Permanent` failures (the backend rejected the request) short-circuit.
/// - `Config` failures (bad credentials, missing or malformed options)
///   short-circuit and fail the job immediately.
///
/// # Examples
///
/// ```
/// use reelweave_error::ErrorClass;
///
/// assert!(ErrorClass::Transient.is_retryable());
/// assert!(!ErrorClass::Permanent.is_retryable());
/// assert_eq!(ErrorClass::from_status(503), ErrorClass::Transient);
/// assert_eq!(ErrorClass::from_status(401), ErrorClass::Config);
/// assert_eq!(ErrorClass::from_status(422), ErrorClass::Permanent);
/// ```
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
pub enum ErrorClass {
    /// Worth retrying after a backoff.
    Transient,
    /// The request itself is unacceptable; retrying cannot help.
    Permanent,
    /// The backend is misconfigured; retrying cannot help.
    Config,
}

impl ErrorClass {
    /// Whether failures of this class are retried.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Transient)
    }

    /// Classify an HTTP status code returned by a remote backend.
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            408 | 425 | 429 => ErrorClass::Transient,
            401 | 403 | 407 => ErrorClass::Config,
            500..=599 => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        }
    }
}
