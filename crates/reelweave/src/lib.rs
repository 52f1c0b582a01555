//! Reelweave - narrated short videos from a topic or a script
//!
//! Reelweave runs a four-stage generation pipeline: write (or split) a
//! script, render an illustration and synthesize narration for every scene,
//! then assemble the scenes into one video. Every stage is a pluggable
//! backend resolved by name from a registry, so a local node-graph server, a
//! hosted API or a media tool can sit behind the same pipeline.
//!
//! # Features
//!
//! - **Pluggable backends**: `Scripter`, `ImageGenerator`, `Speaker` and
//!   `VideoAssembler` traits, registered by name in a [`BackendRegistry`]
//! - **Retry with classification**: transient failures back off and retry,
//!   permanent and configuration failures stop at once
//! - **Bounded scene fan-out**: image and audio per scene run concurrently,
//!   results are reassembled in scene order
//! - **Progress and cancellation**: non-blocking progress events and
//!   cooperative cancellation between stages and scenes
//! - **Job archive and resume**: snapshots on every transition; failed jobs
//!   resume without regenerating finished assets
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reelweave::{
//!     BackendRegistry, BackendSelection, GenerationJob, JobInput, OrchestratorSettings,
//!     PipelineConfig, PipelineOrchestrator, TracingReporter,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::load()?;
//!     let mut registry = BackendRegistry::new();
//!     register_my_backends(&mut registry);
//!
//!     let orchestrator = PipelineOrchestrator::new(
//!         registry,
//!         Arc::new(config.clone()),
//!         OrchestratorSettings::from_config(&config),
//!     )
//!     .with_reporter(Arc::new(TracingReporter));
//!
//!     let job = GenerationJob::new(
//!         JobInput::Topic("the habit of reading".into()),
//!         BackendSelection::default(),
//!     );
//!     let job = orchestrator.start(job).await?;
//!     println!("{}: {:?}", job.status(), job.video);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - export tracing spans through OpenTelemetry
//!
//! # Architecture
//!
//! - `reelweave_error` - error types and failure classification
//! - `reelweave_core` - data model and script segmentation
//! - `reelweave_interface` - backend, reporter, config and repository traits
//! - `reelweave_stage` - stage runner and configuration loading
//! - `reelweave_storage` - asset layout and filesystem job archive
//! - `reelweave_pipeline` - registry, scene fan-out and orchestration
//!
//! This crate re-exports everything for convenience.

pub use reelweave_core::*;
pub use reelweave_error::*;
pub use reelweave_interface::*;
pub use reelweave_pipeline::*;
pub use reelweave_stage::*;
pub use reelweave_storage::*;

mod logging;

pub use logging::{LogFormat, init_logging};

#[cfg(feature = "observability")]
mod observability;

#[cfg(feature = "observability")]
pub use observability::{ObservabilityConfig, init_observability};
