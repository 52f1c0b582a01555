//! Stage execution and configuration for reelweave.
//!
//! [`StageRunner`] wraps a single backend call with the retry, backoff and
//! timeout policy of its stage and reduces whatever happens to a
//! [`StageResult`](reelweave_core::StageResult). [`PipelineConfig`] loads the
//! layered TOML configuration those policies come from and serves backend
//! configuration to the orchestrator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod emitter;
mod policy;
mod runner;

pub use config::{PipelineConfig, PipelineSection, RetryConfig, RetryOverride, RetrySection};
pub use emitter::ProgressEmitter;
pub use policy::RetryPolicy;
pub use runner::{StageContext, StageRunner};
pub use tokio_util::sync::CancellationToken;
