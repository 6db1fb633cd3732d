//! Provider registry: builds providers from ids and options.
//!
//! A provider id has the form `<prefix>:<path>` (e.g. `openai:chat:gpt-4o`).
//! The prefix selects a registered constructor, which interprets the path.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ProviderOptions, SharedProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// What a constructor receives.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec<'a> {
    /// The id as requested.
    pub id: &'a str,
    /// Part of the id before the first `:`.
    pub prefix: &'a str,
    /// Part of the id after the first `:`.
    pub path: &'a str,
    /// Options, when the provider was requested in structured form.
    pub options: Option<&'a ProviderOptions>,
}

/// Builds a provider from a [`ProviderSpec`].
pub type ProviderConstructor =
    Arc<dyn Fn(&ProviderSpec<'_>) -> ProviderResult<SharedProvider> + Send + Sync>;

/// Turns provider ids and options into provider instances.
#[async_trait]
pub trait ProviderLoader: Send + Sync {
    /// Load a provider from an id string.
    async fn load_from_id(&self, id: &str) -> ProviderResult<SharedProvider>;

    /// Load a provider from structured options.
    async fn load_from_options(&self, options: &ProviderOptions) -> ProviderResult<SharedProvider>;
}

/// Registry of provider constructors keyed by id prefix.
#[derive(Default)]
pub struct ProviderRegistry {
    constructors: RwLock<HashMap<String, ProviderConstructor>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the built-in providers registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        #[cfg(feature = "openai")]
        registry.register("openai", crate::openai::construct);
        registry
    }

    /// Register a constructor for an id prefix.
    pub fn register<F>(&self, prefix: impl Into<String>, constructor: F)
    where
        F: Fn(&ProviderSpec<'_>) -> ProviderResult<SharedProvider> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(prefix.into(), Arc::new(constructor));
    }

    /// Check if a prefix is registered.
    pub fn contains(&self, prefix: &str) -> bool {
        self.constructors.read().contains_key(prefix)
    }

    /// List registered prefixes.
    pub fn list(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.constructors.read().keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    /// Remove a constructor.
    pub fn remove(&self, prefix: &str) -> Option<ProviderConstructor> {
        self.constructors.write().remove(prefix)
    }

    /// Build a provider synchronously.
    pub fn build(&self, id: &str, options: Option<&ProviderOptions>) -> ProviderResult<SharedProvider> {
        let (prefix, path) = split_provider_id(id)?;
        let constructor = self
            .constructors
            .read()
            .get(prefix)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(prefix.to_string()))?;

        debug!(provider_id = %id, prefix, "Building provider");
        constructor(&ProviderSpec {
            id,
            prefix,
            path,
            options,
        })
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("prefixes", &self.list())
            .finish()
    }
}

#[async_trait]
impl ProviderLoader for ProviderRegistry {
    async fn load_from_id(&self, id: &str) -> ProviderResult<SharedProvider> {
        self.build(id, None)
    }

    async fn load_from_options(&self, options: &ProviderOptions) -> ProviderResult<SharedProvider> {
        self.build(&options.id, Some(options))
    }
}

/// Split `prefix:path`.
pub fn split_provider_id(id: &str) -> ProviderResult<(&str, &str)> {
    match id.split_once(':') {
        Some((prefix, path)) if !prefix.is_empty() && !path.is_empty() => Ok((prefix, path)),
        _ => Err(ProviderError::InvalidProviderId(id.to_string())),
    }
}

static GLOBAL_REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

/// Get the process-wide registry, initialized with the built-in providers.
pub fn global_registry() -> &'static ProviderRegistry {
    GLOBAL_REGISTRY.get_or_init(ProviderRegistry::with_defaults)
}
