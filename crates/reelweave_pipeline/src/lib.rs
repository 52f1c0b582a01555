//! Job orchestration for reelweave.
//!
//! This crate turns a topic or fixed script into a finished video:
//!
//! - [`BackendRegistry`] maps (capability kind, name) to backend factories
//! - [`SceneProcessor`] runs image and audio generation for every scene
//!   under a concurrency limit and reassembles results in index order
//! - [`PipelineOrchestrator`] drives the job state machine from script to
//!   assembly, reports progress, honors cancellation and archives snapshots
//!
//! Progress sinks ([`ChannelReporter`], [`TracingReporter`],
//! [`NullReporter`]) and an [`InMemoryJobRepository`] are provided for
//! embedding and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod in_memory_repository;
mod orchestrator;
mod registry;
mod reporter;
mod scene_processor;
mod settings;

pub use in_memory_repository::InMemoryJobRepository;
pub use orchestrator::PipelineOrchestrator;
pub use registry::{
    AssemblerFactory, BackendFactory, BackendHandle, BackendRegistry, ImageFactory,
    ScripterFactory, SpeakerFactory,
};
pub use reporter::{ChannelReporter, NullReporter, TracingReporter};
pub use scene_processor::{SceneBackends, SceneBatch, SceneContext, SceneFailure, SceneProcessor};
pub use settings::{OrchestratorSettings, OrchestratorSettingsBuilder};
