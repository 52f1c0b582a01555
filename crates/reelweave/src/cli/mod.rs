//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the reelweave binary.

mod commands;
mod config;
mod jobs;
mod split;

pub use commands::{Cli, Commands};
pub use config::handle_config_command;
pub use jobs::handle_jobs_command;
pub use split::split_script;
