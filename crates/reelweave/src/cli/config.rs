//! Configuration command handlers.

use super::commands::ConfigCommands;
use reelweave::{PipelineConfig, ReelweaveResult};

/// Handle configuration commands.
pub fn handle_config_command(cmd: ConfigCommands, config: &PipelineConfig) -> ReelweaveResult<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
