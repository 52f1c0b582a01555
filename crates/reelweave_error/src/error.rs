//! Top-level error wrapper types.

use crate::{
    CapabilityError, CapabilityErrorKind, ConfigError, ErrorClass, JsonError, PipelineError,
    PipelineErrorKind, RegistryError, StorageError,
};

/// Every error the reelweave crates can produce.
///
/// # Examples
///
/// ```
/// use reelweave_error::{ReelweaveError, ConfigError};
///
/// let err: ReelweaveError = ConfigError::new("concurrency must be at least 1").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelweaveErrorKind {
    /// Classified capability failure
    #[from(CapabilityError)]
    Capability(CapabilityError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Backend registry lookup failure
    #[from(RegistryError)]
    Registry(RegistryError),
    /// Orchestration failure
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Asset or job archive failure
    #[from(StorageError)]
    Storage(StorageError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Reelweave error with kind discrimination.
///
/// # Examples
///
/// ```
/// use reelweave_error::{ErrorClass, ReelweaveResult, CapabilityError, CapabilityErrorKind};
///
/// fn render() -> ReelweaveResult<()> {
///     Err(CapabilityError::new(CapabilityErrorKind::Timeout(30_000)))?
/// }
///
/// let err = render().unwrap_err();
/// assert_eq!(err.class(), ErrorClass::Transient);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reelweave Error: {}", _0)]
pub struct ReelweaveError(Box<ReelweaveErrorKind>);

impl ReelweaveError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelweaveErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelweaveErrorKind {
        &self.0
    }

    /// Default failure classification for this error.
    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            ReelweaveErrorKind::Capability(e) => e.kind.class(),
            ReelweaveErrorKind::Config(_) | ReelweaveErrorKind::Registry(_) => ErrorClass::Config,
            ReelweaveErrorKind::Pipeline(_)
            | ReelweaveErrorKind::Storage(_)
            | ReelweaveErrorKind::Json(_) => ErrorClass::Permanent,
        }
    }

    /// The capability failure behind this error, if it is one.
    pub fn capability_kind(&self) -> Option<&CapabilityErrorKind> {
        match self.kind() {
            ReelweaveErrorKind::Capability(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Whether this error records a caller-requested cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.kind(),
            ReelweaveErrorKind::Pipeline(PipelineError {
                kind: PipelineErrorKind::Cancelled(_),
                ..
            })
        )
    }
}

// Generic From implementation for any type that converts to ReelweaveErrorKind
impl<T> From<T> for ReelweaveError
where
    T: Into<ReelweaveErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for reelweave operations.
pub type ReelweaveResult<T> = std::result::Result<T, ReelweaveError>;
