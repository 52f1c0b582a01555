//! Reelweave CLI binary.
//!
//! This binary provides command-line access to reelweave's tooling:
//! - Split a fixed script into scenes
//! - Show the effective configuration
//! - Inspect, duplicate and prune the job archive

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, handle_config_command, handle_jobs_command, split_script};

    // Pick up RUST_LOG and friends from a local .env, if any
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let format = if cli.json_logs {
        reelweave::LogFormat::Json
    } else {
        reelweave::LogFormat::Text
    };

    #[cfg(feature = "observability")]
    reelweave::init_observability(
        reelweave::ObservabilityConfig::default()
            .with_verbose(cli.verbose)
            .with_format(format),
    )?;
    #[cfg(not(feature = "observability"))]
    reelweave::init_logging(cli.verbose, format)?;

    let config = cli.load_config()?;

    match cli.command {
        Commands::Split {
            input,
            text,
            rule,
        } => split_script(input.as_deref(), text.as_deref(), rule, &config).await?,

        Commands::Config(cmd) => handle_config_command(cmd, &config)?,

        Commands::Jobs(cmd) => handle_jobs_command(cmd, &config).await?,
    }

    Ok(())
}
