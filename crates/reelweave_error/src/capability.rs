//! Errors raised by capability backends (script, image, speech, assembly).

use crate::ErrorClass;

/// Specific failure conditions a backend can report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CapabilityErrorKind {
    /// Connection could not be established or was dropped
    #[display("Network failure: {}", _0)]
    Network(String),
    /// The call did not finish within its deadline
    #[display("Timed out after {} ms", _0)]
    Timeout(u64),
    /// The remote service answered with an error status
    #[display("HTTP {} error: {}", status_code, message)]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// The backend rejected the request as invalid (e.g. unsupported dimensions)
    #[display("Request rejected: {}", _0)]
    Rejected(String),
    /// Credentials were missing or refused
    #[display("Unauthorized: {}", _0)]
    Unauthorized(String),
    /// An external media tool exited unsuccessfully
    #[display("Process exited with code {:?}: {}", code, stderr)]
    ProcessExit {
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error (possibly truncated)
        stderr: String,
    },
    /// The backend returned output that could not be interpreted
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
    /// Local file I/O failed while reading or writing an asset
    #[display("I/O failure: {}", _0)]
    Io(String),
}

impl CapabilityErrorKind {
    /// Default classification for this failure.
    ///
    /// Backends with provider-specific knowledge may override this through
    /// their own classifier.
    pub fn class(&self) -> ErrorClass {
        match self {
            CapabilityErrorKind::Network(_) | CapabilityErrorKind::Timeout(_) => {
                ErrorClass::Transient
            }
            CapabilityErrorKind::HttpStatus { status_code, .. } => {
                ErrorClass::from_status(*status_code)
            }
            CapabilityErrorKind::Unauthorized(_) => ErrorClass::Config,
            CapabilityErrorKind::Rejected(_)
            | CapabilityErrorKind::ProcessExit { .. }
            | CapabilityErrorKind::MalformedResponse(_)
            | CapabilityErrorKind::Io(_) => ErrorClass::Permanent,
        }
    }
}

/// Capability error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelweave_error::{CapabilityError, CapabilityErrorKind, ErrorClass};
///
/// let err = CapabilityError::new(CapabilityErrorKind::HttpStatus {
///     status_code: 503,
///     message: "queue full".to_string(),
/// });
/// assert_eq!(err.kind.class(), ErrorClass::Transient);
/// assert!(format!("{}", err).contains("503"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Capability Error: {} at line {} in {}", kind, line, file)]
pub struct CapabilityError {
    /// The kind of error that occurred
    pub kind: CapabilityErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CapabilityError {
    /// Create a new CapabilityError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CapabilityErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
