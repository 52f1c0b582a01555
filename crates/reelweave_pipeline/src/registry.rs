//! Backend registry.
//!
//! Backends are registered by capability kind and name as factories. A
//! factory receives the backend's [`BackendConfig`] and either validates it
//! and returns a handle, or rejects it. Nothing is constructed until a stage
//! asks for it, so a bad configuration only fails the stage that needs it.

use reelweave_core::{BackendConfig, BackendKind};
use reelweave_error::{ReelweaveError, ReelweaveResult, RegistryError, RegistryErrorKind};
use reelweave_interface::{ImageGenerator, Scripter, Speaker, VideoAssembler};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a scripter from its configuration.
pub type ScripterFactory =
    Arc<dyn Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Scripter>> + Send + Sync>;
/// Builds an image generator from its configuration.
pub type ImageFactory =
    Arc<dyn Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn ImageGenerator>> + Send + Sync>;
/// Builds a speaker from its configuration.
pub type SpeakerFactory =
    Arc<dyn Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Speaker>> + Send + Sync>;
/// Builds a video assembler from its configuration.
pub type AssemblerFactory =
    Arc<dyn Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn VideoAssembler>> + Send + Sync>;

/// A factory for one capability kind.
#[derive(Clone)]
pub enum BackendFactory {
    /// Script generation
    Scripter(ScripterFactory),
    /// Image generation
    Image(ImageFactory),
    /// Speech synthesis
    Speaker(SpeakerFactory),
    /// Video composition
    Assembler(AssemblerFactory),
}

impl BackendFactory {
    /// Wrap a scripter constructor.
    pub fn scripter<F>(factory: F) -> Self
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Scripter>> + Send + Sync + 'static,
    {
        Self::Scripter(Arc::new(factory))
    }

    /// Wrap an image generator constructor.
    pub fn image<F>(factory: F) -> Self
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn ImageGenerator>> + Send + Sync + 'static,
    {
        Self::Image(Arc::new(factory))
    }

    /// Wrap a speaker constructor.
    pub fn speaker<F>(factory: F) -> Self
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Speaker>> + Send + Sync + 'static,
    {
        Self::Speaker(Arc::new(factory))
    }

    /// Wrap a video assembler constructor.
    pub fn assembler<F>(factory: F) -> Self
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn VideoAssembler>> + Send + Sync + 'static,
    {
        Self::Assembler(Arc::new(factory))
    }

    /// The capability kind this factory produces.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Scripter(_) => BackendKind::Scripter,
            Self::Image(_) => BackendKind::Image,
            Self::Speaker(_) => BackendKind::Speaker,
            Self::Assembler(_) => BackendKind::Assembler,
        }
    }

    fn build(&self, config: &BackendConfig) -> ReelweaveResult<BackendHandle> {
        Ok(match self {
            Self::Scripter(factory) => BackendHandle::Scripter(factory(config)?),
            Self::Image(factory) => BackendHandle::Image(factory(config)?),
            Self::Speaker(factory) => BackendHandle::Speaker(factory(config)?),
            Self::Assembler(factory) => BackendHandle::Assembler(factory(config)?),
        })
    }
}

impl std::fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BackendFactory::{}", self.kind())
    }
}

/// A constructed backend.
#[derive(Clone)]
pub enum BackendHandle {
    /// Script generation
    Scripter(Arc<dyn Scripter>),
    /// Image generation
    Image(Arc<dyn ImageGenerator>),
    /// Speech synthesis
    Speaker(Arc<dyn Speaker>),
    /// Video composition
    Assembler(Arc<dyn VideoAssembler>),
}

impl BackendHandle {
    /// The capability kind of this backend.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Scripter(_) => BackendKind::Scripter,
            Self::Image(_) => BackendKind::Image,
            Self::Speaker(_) => BackendKind::Speaker,
            Self::Assembler(_) => BackendKind::Assembler,
        }
    }

    /// The backend's own name.
    pub fn name(&self) -> &str {
        match self {
            Self::Scripter(b) => b.name(),
            Self::Image(b) => b.name(),
            Self::Speaker(b) => b.name(),
            Self::Assembler(b) => b.name(),
        }
    }

    /// The scripter, if this is one.
    pub fn into_scripter(self) -> Option<Arc<dyn Scripter>> {
        match self {
            Self::Scripter(b) => Some(b),
            _ => None,
        }
    }

    /// The image generator, if this is one.
    pub fn into_image(self) -> Option<Arc<dyn ImageGenerator>> {
        match self {
            Self::Image(b) => Some(b),
            _ => None,
        }
    }

    /// The speaker, if this is one.
    pub fn into_speaker(self) -> Option<Arc<dyn Speaker>> {
        match self {
            Self::Speaker(b) => Some(b),
            _ => None,
        }
    }

    /// The assembler, if this is one.
    pub fn into_assembler(self) -> Option<Arc<dyn VideoAssembler>> {
        match self {
            Self::Assembler(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BackendHandle::{}({})", self.kind(), self.name())
    }
}

/// Registry of backend factories keyed by (kind, name).
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = BackendRegistry::new();
/// registry.register_image("comfyui", |config| {
///     let endpoint = config.require_endpoint("endpoint_url")?;
///     Ok(Arc::new(ComfyUiImages::new(endpoint)) as Arc<dyn ImageGenerator>)
/// });
///
/// let image = registry.resolve_image("comfyui", &config)?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<(BackendKind, String), BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` as backend `name` of `kind`.
    ///
    /// Re-registering a name replaces the previous factory. Fails when the
    /// factory produces a different kind than `kind`.
    pub fn register(
        &mut self,
        kind: BackendKind,
        name: impl Into<String>,
        factory: BackendFactory,
    ) -> ReelweaveResult<()> {
        let name = name.into();
        if factory.kind() != kind {
            return Err(RegistryError::new(RegistryErrorKind::BackendConfigInvalid {
                kind: kind.to_string(),
                name,
                reason: format!("factory produces {} backends", factory.kind()),
            })
            .into());
        }
        self.insert(name, factory);
        Ok(())
    }

    /// Store `factory` under its own kind.
    fn insert(&mut self, name: impl Into<String>, factory: BackendFactory) {
        let kind = factory.kind();
        let name = name.into();
        if self
            .factories
            .insert((kind, name.clone()), factory)
            .is_some()
        {
            tracing::warn!(kind = %kind, name = %name, "Replacing registered backend");
        } else {
            tracing::debug!(kind = %kind, name = %name, "Registered backend");
        }
    }

    /// Register a scripter.
    pub fn register_scripter<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Scripter>> + Send + Sync + 'static,
    {
        self.insert(name, BackendFactory::scripter(factory));
    }

    /// Register an image generator.
    pub fn register_image<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn ImageGenerator>> + Send + Sync + 'static,
    {
        self.insert(name, BackendFactory::image(factory));
    }

    /// Register a speaker.
    pub fn register_speaker<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn Speaker>> + Send + Sync + 'static,
    {
        self.insert(name, BackendFactory::speaker(factory));
    }

    /// Register a video assembler.
    pub fn register_assembler<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendConfig) -> ReelweaveResult<Arc<dyn VideoAssembler>> + Send + Sync + 'static,
    {
        self.insert(name, BackendFactory::assembler(factory));
    }

    /// Construct backend `name` of `kind` with `config`.
    ///
    /// # Errors
    ///
    /// `BackendNotFound` if nothing is registered under that name for that
    /// kind; `BackendConfigInvalid` if the factory rejects the configuration.
    #[tracing::instrument(skip(self, config))]
    pub fn resolve(
        &self,
        kind: BackendKind,
        name: &str,
        config: &BackendConfig,
    ) -> ReelweaveResult<BackendHandle> {
        let factory = self
            .factories
            .get(&(kind, name.to_string()))
            .ok_or_else(|| {
                RegistryError::new(RegistryErrorKind::BackendNotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                })
            })?;

        let handle = factory.build(config).map_err(|e| {
            tracing::warn!(error = %e, "Backend rejected its configuration");
            RegistryError::new(RegistryErrorKind::BackendConfigInvalid {
                kind: kind.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })
        })?;

        tracing::debug!(backend = handle.name(), "Resolved backend");
        Ok(handle)
    }

    /// Resolve a scripter.
    pub fn resolve_scripter(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> ReelweaveResult<Arc<dyn Scripter>> {
        self.resolve(BackendKind::Scripter, name, config)?
            .into_scripter()
            .ok_or_else(|| kind_mismatch(BackendKind::Scripter, name))
    }

    /// Resolve an image generator.
    pub fn resolve_image(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> ReelweaveResult<Arc<dyn ImageGenerator>> {
        self.resolve(BackendKind::Image, name, config)?
            .into_image()
            .ok_or_else(|| kind_mismatch(BackendKind::Image, name))
    }

    /// Resolve a speaker.
    pub fn resolve_speaker(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> ReelweaveResult<Arc<dyn Speaker>> {
        self.resolve(BackendKind::Speaker, name, config)?
            .into_speaker()
            .ok_or_else(|| kind_mismatch(BackendKind::Speaker, name))
    }

    /// Resolve a video assembler.
    pub fn resolve_assembler(
        &self,
        name: &str,
        config: &BackendConfig,
    ) -> ReelweaveResult<Arc<dyn VideoAssembler>> {
        self.resolve(BackendKind::Assembler, name, config)?
            .into_assembler()
            .ok_or_else(|| kind_mismatch(BackendKind::Assembler, name))
    }

    /// Registered names for `kind`, sorted.
    pub fn names(&self, kind: BackendKind) -> Vec<&str> {
        self.factories
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Whether `name` is registered for `kind`.
    pub fn contains(&self, kind: BackendKind, name: &str) -> bool {
        self.factories.contains_key(&(kind, name.to_string()))
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

fn kind_mismatch(kind: BackendKind, name: &str) -> ReelweaveError {
    RegistryError::new(RegistryErrorKind::BackendConfigInvalid {
        kind: kind.to_string(),
        name: name.to_string(),
        reason: "registered factory produced a different kind".to_string(),
    })
    .into()
}
