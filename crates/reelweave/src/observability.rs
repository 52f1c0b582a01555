//! Span export through OpenTelemetry.
//!
//! Job, stage and scene spans go to a stdout exporter, next to the same
//! console log `init_logging` installs.

use crate::LogFormat;
use crate::logging::{console_layer, env_filter};
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use opentelemetry_stdout::SpanExporter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How the binary reports itself and logs while exporting spans.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// `service.name` on exported spans
    pub service_name: String,
    /// `service.version` on exported spans
    pub service_version: String,
    /// Debug logging for reelweave crates
    pub verbose: bool,
    /// Console log format
    pub format: LogFormat,
}

impl ObservabilityConfig {
    /// Turn on debug logging for reelweave crates.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the console log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            verbose: false,
            format: LogFormat::Text,
        }
    }
}

/// Install the console log plus an OpenTelemetry span layer.
///
/// Filtering follows [`init_logging`](crate::init_logging).
///
/// # Errors
///
/// Fails if `RUST_LOG` cannot be parsed or a subscriber is already installed.
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes(vec![KeyValue::new(
            "service.version",
            config.service_version,
        )])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(SpanExporter::default())
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());

    let spans = tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name));

    tracing_subscriber::registry()
        .with(env_filter(config.verbose)?)
        .with(console_layer(config.format))
        .with(spans)
        .try_init()?;

    Ok(())
}
