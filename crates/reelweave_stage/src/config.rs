//! Layered TOML configuration.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from reelweave.toml)
//! - User overrides (~/.config/reelweave/reelweave.toml, then ./reelweave.toml)
//! - Automatic merging with user values taking precedence

use crate::RetryPolicy;
use config::{Config, File, FileFormat};
use reelweave_core::{BackendConfig, BackendKind, ScenePolicy, SegmentationRule, Stage};
use reelweave_error::{ConfigError, ReelweaveError, ReelweaveResult};
use reelweave_interface::ConfigStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../reelweave.toml");

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineSection {
    /// Scenes in flight at once
    pub concurrency: usize,
    /// What to do with failed scenes
    #[serde(default)]
    pub scene_policy: ScenePolicy,
    /// How fixed scripts are cut into scenes
    #[serde(default)]
    pub segmentation: SegmentationRule,
    /// Root directory for job output
    pub output_dir: PathBuf,
    /// Progress channel capacity
    pub progress_buffer: usize,
    /// Length of titles derived from a fixed script
    pub title_max_chars: usize,
    /// Narrations per image prompt request
    #[serde(default = "default_prompt_batch_size")]
    pub prompt_batch_size: usize,
}

fn default_prompt_batch_size() -> usize {
    10
}

/// Retry settings for one stage.
///
/// # Example
///
/// ```toml
/// [retry.default]
/// transient_retries = 2
/// base_delay_ms = 1000
/// max_delay_ms = 10000
/// timeout_secs = 300
/// jitter = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retries for transient failures
    pub transient_retries: usize,
    /// First backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,
    /// Per-attempt timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Randomize delays
    #[serde(default)]
    pub jitter: bool,
}

/// Stage-specific retry overrides; unset fields fall back to `[retry.default]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RetryOverride {
    /// Retries for transient failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient_retries: Option<usize>,
    /// First backoff delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
    /// Backoff cap in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    /// Per-attempt timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Randomize delays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<bool>,
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrySection {
    /// Settings every stage starts from
    pub default: RetryConfig,
    /// Script stage overrides
    #[serde(default)]
    pub script: RetryOverride,
    /// Image stage overrides
    #[serde(default)]
    pub image: RetryOverride,
    /// Audio stage overrides
    #[serde(default)]
    pub audio: RetryOverride,
    /// Assembly stage overrides
    #[serde(default)]
    pub assembly: RetryOverride,
}

impl RetrySection {
    /// Effective settings for `stage`.
    pub fn for_stage(&self, stage: Stage) -> RetryConfig {
        let stage_override = match stage {
            Stage::Script => &self.script,
            Stage::Image => &self.image,
            Stage::Audio => &self.audio,
            Stage::Assembly => &self.assembly,
        };
        RetryConfig {
            transient_retries: stage_override
                .transient_retries
                .unwrap_or(self.default.transient_retries),
            base_delay_ms: stage_override
                .base_delay_ms
                .unwrap_or(self.default.base_delay_ms),
            max_delay_ms: stage_override
                .max_delay_ms
                .unwrap_or(self.default.max_delay_ms),
            timeout_secs: stage_override.timeout_secs.or(self.default.timeout_secs),
            jitter: stage_override.jitter.unwrap_or(self.default.jitter),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            transient_retries: config.transient_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            timeout: config.timeout_secs.map(Duration::from_secs),
            jitter: config.jitter,
        }
    }
}

/// Top-level reelweave configuration.
///
/// Loads from TOML files with a precedence system:
/// 1. Bundled defaults (reelweave.toml shipped with the library)
/// 2. User config in home directory (~/.config/reelweave/reelweave.toml)
/// 3. User config in current directory (./reelweave.toml)
///
/// # Example
///
/// ```no_run
/// use reelweave_core::Stage;
/// use reelweave_stage::PipelineConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::load()?;
/// println!("concurrency: {}", config.pipeline.concurrency);
/// println!("image retries: {}", config.retry_policy(Stage::Image).transient_retries);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// `[pipeline]`
    pub pipeline: PipelineSection,
    /// `[retry]`
    pub retry: RetrySection,
    /// `[backends.<kind>]`, keyed by kind name
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

impl PipelineConfig {
    /// The bundled defaults alone.
    #[instrument]
    pub fn bundled() -> ReelweaveResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)))
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> ReelweaveResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/reelweave/reelweave.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("reelweave").required(false));

        Self::build(builder)
    }

    /// Load bundled defaults overridden by a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ReelweaveResult<Self> {
        debug!("Loading configuration from file");

        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Load bundled defaults overridden by TOML text.
    pub fn from_toml_str(toml: &str) -> ReelweaveResult<Self> {
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ReelweaveResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                ReelweaveError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ReelweaveError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.concurrency == 0 {
            return Err(ConfigError::new("pipeline.concurrency must be at least 1"));
        }
        if self.pipeline.progress_buffer == 0 {
            return Err(ConfigError::new("pipeline.progress_buffer must be at least 1"));
        }
        if self.pipeline.prompt_batch_size == 0 {
            return Err(ConfigError::new("pipeline.prompt_batch_size must be at least 1"));
        }
        for stage in [Stage::Script, Stage::Image, Stage::Audio, Stage::Assembly] {
            let retry = self.retry.for_stage(stage);
            if retry.base_delay_ms > retry.max_delay_ms {
                return Err(ConfigError::new(format!(
                    "retry.{}: base_delay_ms ({}) exceeds max_delay_ms ({})",
                    stage, retry.base_delay_ms, retry.max_delay_ms
                )));
            }
            if retry.timeout_secs == Some(0) {
                return Err(ConfigError::new(format!(
                    "retry.{}: timeout_secs must be positive",
                    stage
                )));
            }
        }
        Ok(())
    }

    /// Retry policy for `stage`.
    pub fn retry_policy(&self, stage: Stage) -> RetryPolicy {
        RetryPolicy::from(&self.retry.for_stage(stage))
    }

    /// Set the backend for `kind`, replacing any existing entry.
    pub fn set_backend(&mut self, kind: BackendKind, config: BackendConfig) {
        self.backends.insert(kind.to_string(), config);
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> ReelweaveResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ReelweaveError::from(ConfigError::new(format!(
                "Failed to serialize configuration: {}",
                e
            )))
        })
    }
}

impl ConfigStore for PipelineConfig {
    fn backend_config(&self, kind: BackendKind) -> ReelweaveResult<BackendConfig> {
        self.backends.get(&kind.to_string()).cloned().ok_or_else(|| {
            ConfigError::new(format!(
                "no backend configured for '{}' (add a [backends.{}] section)",
                kind, kind
            ))
            .into()
        })
    }
}
