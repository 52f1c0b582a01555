//! Error types for the reelweave video pipeline.
//!
//! This crate provides the foundation error types used throughout the reelweave workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every error can be reduced to an [`ErrorClass`], which is what the stage
//! runner uses to decide between retrying and giving up.
//!
//! # Examples
//!
//! ```
//! use reelweave_error::{ReelweaveResult, CapabilityError, CapabilityErrorKind};
//!
//! fn synthesize() -> ReelweaveResult<Vec<u8>> {
//!     Err(CapabilityError::new(CapabilityErrorKind::Network("connection refused".into())))?
//! }
//!
//! match synthesize() {
//!     Ok(audio) => println!("Got {} bytes", audio.len()),
//!     Err(e) => eprintln!("Error ({}): {}", e.class(), e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capability;
mod class;
mod config;
mod error;
mod json;
mod pipeline;
mod registry;
mod storage;

pub use capability::{CapabilityError, CapabilityErrorKind};
pub use class::ErrorClass;
pub use config::ConfigError;
pub use error::{ReelweaveError, ReelweaveErrorKind, ReelweaveResult};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use registry::{RegistryError, RegistryErrorKind};
pub use storage::{StorageError, StorageErrorKind};
