//! Backend registry error types.

/// Backend lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RegistryErrorKind {
    /// No backend with this name is registered for the capability kind
    #[display("No {} backend registered under '{}'", kind, name)]
    BackendNotFound {
        /// Capability kind (scripter, image, speaker, assembler)
        kind: String,
        /// Requested backend name
        name: String,
    },
    /// The backend rejected its configuration
    #[display("Invalid configuration for {} backend '{}': {}", kind, name, reason)]
    BackendConfigInvalid {
        /// Capability kind (scripter, image, speaker, assembler)
        kind: String,
        /// Backend name
        name: String,
        /// Why the configuration was rejected
        reason: String,
    },
}

/// Registry error with location tracking.
///
/// # Examples
///
/// ```
/// use reelweave_error::{RegistryError, RegistryErrorKind};
///
/// let err = RegistryError::new(RegistryErrorKind::BackendNotFound {
///     kind: "image".to_string(),
///     name: "runninghub".to_string(),
/// });
/// assert!(format!("{}", err).contains("runninghub"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    /// The specific error condition
    pub kind: RegistryErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl RegistryError {
    /// Create a new RegistryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
