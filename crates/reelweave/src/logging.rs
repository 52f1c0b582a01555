//! Console logging bootstrap.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` for
/// reelweave crates when `verbose` is on.
///
/// # Errors
///
/// Fails if `RUST_LOG` cannot be parsed or a subscriber is already installed.
pub fn init_logging(
    verbose: bool,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(env_filter(verbose)?)
        .with(console_layer(format))
        .try_init()?;

    Ok(())
}

pub(crate) fn env_filter(
    verbose: bool,
) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
    let default_directive = if verbose {
        "info,reelweave=debug,reelweave_pipeline=debug,reelweave_stage=debug"
    } else {
        "info"
    };
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?)
}

pub(crate) fn console_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().with_target(false).boxed(),
    }
}
