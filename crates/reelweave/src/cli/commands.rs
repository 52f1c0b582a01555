//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use reelweave::{JobStatus, PipelineConfig, ReelweaveResult, SegmentationRule};
use std::path::PathBuf;

/// Reelweave - narrated short videos from a topic or a script
#[derive(Parser, Debug)]
#[command(name = "reelweave")]
#[command(about = "Narrated short videos from a topic or a script", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the bundled defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory, overriding `pipeline.output_dir`
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Effective configuration for this invocation.
    pub fn load_config(&self) -> ReelweaveResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::load()?,
        };
        if let Some(dir) = &self.output_dir {
            config.pipeline.output_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a fixed script into scenes and print them as JSON
    Split {
        /// Script file; reads standard input when neither this nor --text is given
        input: Option<PathBuf>,

        /// Script text given inline
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        /// Segmentation rule, overriding `pipeline.segmentation`
        #[arg(long)]
        rule: Option<RuleArg>,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Job archive commands
    #[command(subcommand)]
    Jobs(JobsCommands),
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

/// Job archive subcommands
#[derive(Subcommand, Debug)]
pub enum JobsCommands {
    /// List archived jobs, newest first
    List {
        /// Status filter
        #[arg(long)]
        status: Option<StatusArg>,

        /// Maximum number of jobs to display
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show one job snapshot as JSON
    Show {
        /// Job id
        id: String,
    },

    /// Delete a job together with its generated assets
    Delete {
        /// Job id
        id: String,
    },

    /// Store a new pending job repeating another job's request
    Duplicate {
        /// Job id to copy
        id: String,
    },

    /// Totals over the archive
    Stats {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Segmentation rule argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleArg {
    /// Every non-empty line is a scene
    Lines,
    /// Lines are split further at sentence ends
    Sentences,
}

impl From<RuleArg> for SegmentationRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Lines => SegmentationRule::Lines,
            RuleArg::Sentences => SegmentationRule::Sentences,
        }
    }
}

/// Job status argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    /// Not started
    Pending,
    /// Writing the script
    GeneratingScript,
    /// Rendering scenes
    GeneratingScenes,
    /// Composing the video
    Assembling,
    /// Finished
    Completed,
    /// Failed or cancelled
    Failed,
}

impl From<StatusArg> for JobStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => JobStatus::Pending,
            StatusArg::GeneratingScript => JobStatus::GeneratingScript,
            StatusArg::GeneratingScenes => JobStatus::GeneratingScenes,
            StatusArg::Assembling => JobStatus::Assembling,
            StatusArg::Completed => JobStatus::Completed,
            StatusArg::Failed => JobStatus::Failed,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_split_with_rule() {
        let cli = Cli::try_parse_from(["reelweave", "split", "--text", "a\nb", "--rule", "sentences"])
            .unwrap();
        match cli.command {
            Commands::Split { input, text, rule } => {
                assert!(input.is_none());
                assert_eq!(text.as_deref(), Some("a\nb"));
                assert_eq!(rule, Some(RuleArg::Sentences));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn split_rejects_file_and_text_together() {
        assert!(Cli::try_parse_from(["reelweave", "split", "script.txt", "--text", "x"]).is_err());
    }

    #[test]
    fn parses_jobs_list_filters() {
        let cli = Cli::try_parse_from([
            "reelweave",
            "jobs",
            "list",
            "--status",
            "failed",
            "--limit",
            "5",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Jobs(JobsCommands::List {
                status,
                limit,
                format,
            }) => {
                assert_eq!(status.map(JobStatus::from), Some(JobStatus::Failed));
                assert_eq!(limit, 5);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_jobs_stats_and_duplicate() {
        let cli = Cli::try_parse_from(["reelweave", "jobs", "stats", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Jobs(JobsCommands::Stats {
                format: OutputFormat::Json
            })
        ));

        let cli = Cli::try_parse_from(["reelweave", "jobs", "duplicate", "abc"]).unwrap();
        match cli.command {
            Commands::Jobs(JobsCommands::Duplicate { id }) => assert_eq!(id, "abc"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reelweave",
            "config",
            "show",
            "--output-dir",
            "/tmp/out",
            "--json-logs",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show)));
    }
}
