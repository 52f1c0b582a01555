//! Backend kinds and their configuration.

use reelweave_error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// The four pluggable capabilities.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    /// Script generation (LLM)
    Scripter,
    /// Per-scene image generation
    Image,
    /// Text-to-speech
    Speaker,
    /// Final video composition
    Assembler,
}

/// Configuration handed to a backend factory.
///
/// `backend` names the registered implementation; `options` is a free-form
/// table whose recognized keys depend on the backend (endpoint URL, API key,
/// default workflow, ...). Options are validated by the backend's own factory
/// when the registry resolves it, so a bad entry only fails the stage that
/// needs that backend.
///
/// # Examples
///
/// ```
/// use reelweave_core::BackendConfig;
///
/// let config = BackendConfig::new("comfyui")
///     .with_option("endpoint_url", "http://127.0.0.1:8188")
///     .with_option("width", 1024);
///
/// assert_eq!(config.require_endpoint("endpoint_url").unwrap(), "http://127.0.0.1:8188");
/// assert_eq!(config.u32_option("width").unwrap(), Some(1024));
/// assert!(config.require_str("api_key").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct BackendConfig {
    /// Registered backend name
    backend: String,
    /// Backend-specific options
    #[serde(default)]
    options: Map<String, JsonValue>,
}

impl BackendConfig {
    /// Configuration selecting `backend` with no options.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            options: Map::new(),
        }
    }

    /// Add or replace an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Point this configuration at a different backend, keeping the options.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Raw option value.
    pub fn option(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    /// String option; `None` when absent, error when present with another type.
    #[track_caller]
    pub fn str_option(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.options.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ConfigError::new(format!(
                "option '{}' of backend '{}' must be a string, got {}",
                key, self.backend, other
            ))),
        }
    }

    /// Non-empty string option that must be present.
    #[track_caller]
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.str_option(key)? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::new(format!(
                "backend '{}' requires option '{}'",
                self.backend, key
            ))),
        }
    }

    /// Unsigned integer option.
    #[track_caller]
    pub fn u32_option(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        match self.options.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    ConfigError::new(format!(
                        "option '{}' of backend '{}' must be a positive integer, got {}",
                        key, self.backend, value
                    ))
                }),
        }
    }

    /// Required option holding an `http://` or `https://` endpoint.
    #[track_caller]
    pub fn require_endpoint(&self, key: &str) -> Result<&str, ConfigError> {
        let url = self.require_str(key)?;
        let host = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "option '{}' of backend '{}' must be an http(s) URL, got '{}'",
                    key, self.backend, url
                ))
            })?;
        let authority = host.split('/').next().unwrap_or_default();
        if authority.is_empty() || authority.contains(char::is_whitespace) {
            return Err(ConfigError::new(format!(
                "option '{}' of backend '{}' has no host: '{}'",
                key, self.backend, url
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_validation_rejects_malformed_urls() {
        let config = BackendConfig::new("cloud")
            .with_option("a", "ftp://example.com")
            .with_option("b", "https://")
            .with_option("c", "https://api.example.com/v1")
            .with_option("d", 42);

        assert!(config.require_endpoint("a").is_err());
        assert!(config.require_endpoint("b").is_err());
        assert!(config.require_endpoint("c").is_ok());
        assert!(config.require_endpoint("d").is_err());
        assert!(config.require_endpoint("missing").is_err());
    }

    #[test]
    fn blank_required_string_is_rejected() {
        let config = BackendConfig::new("cloud").with_option("api_key", "  ");
        assert!(config.require_str("api_key").is_err());
    }

    #[test]
    fn negative_integer_is_rejected() {
        let config = BackendConfig::new("local").with_option("width", -4);
        assert!(config.u32_option("width").is_err());
    }
}
