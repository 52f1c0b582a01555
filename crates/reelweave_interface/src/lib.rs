//! Trait definitions for reelweave pipeline backends.
//!
//! This crate provides the capability traits every backend implements
//! ([`Scripter`], [`ImageGenerator`], [`Speaker`], [`VideoAssembler`]), the
//! request types they receive, and the collaborator traits the orchestrator
//! talks to: [`ProgressReporter`], [`ConfigStore`] and [`JobRepository`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config_store;
mod reporter;
mod repository;
mod requests;
mod traits;

pub use config_store::ConfigStore;
pub use reporter::ProgressReporter;
pub use repository::{JobFilter, JobRepository, JobStatistics, JobSummary};
pub use requests::{
    AssemblyRequest, ImageRequest, PromptRequest, ScriptRequest, SpeechOutput, SpeechRequest,
};
pub use traits::{Backend, ImageGenerator, Scripter, Speaker, VideoAssembler};
