//! Read-only backend configuration lookup.

use reelweave_core::{BackendConfig, BackendKind};
use reelweave_error::{ConfigError, ReelweaveResult};
use std::collections::HashMap;

/// Source of [`BackendConfig`] per capability kind.
///
/// The orchestrator asks for a kind's configuration only when a stage needs
/// that backend, so a missing or broken entry fails that stage alone.
pub trait ConfigStore: Send + Sync {
    /// Configuration for `kind`.
    fn backend_config(&self, kind: BackendKind) -> ReelweaveResult<BackendConfig>;
}

impl ConfigStore for HashMap<BackendKind, BackendConfig> {
    fn backend_config(&self, kind: BackendKind) -> ReelweaveResult<BackendConfig> {
        self.get(&kind).cloned().ok_or_else(|| {
            ConfigError::new(format!("no backend configured for '{}'", kind)).into()
        })
    }
}
