//! Capability-based provider resolution.
//!
//! Grading needs a provider that can do a specific thing: complete text or
//! produce embeddings. [`get_grading_provider`] turns a requested
//! [`ProviderRef`] into a concrete provider, and falls back to a default
//! when a caller-built instance lacks the capability. The fallback is
//! silent, which lets a grading config override only some providers.
//! [`get_and_check_provider`] does the same but checks every resolved
//! provider and logs why it fell back.

use crate::error::ProviderResult;
use crate::provider::{ApiProvider, ProviderRef, SharedProvider};
use crate::registry::ProviderLoader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a provider must be able to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Text completion (`call_api`).
    Text,
    /// Embeddings (`call_embedding_api`).
    Embedding,
}

impl Capability {
    /// Capability name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Embedding => "embedding",
        }
    }

    /// Check whether `provider` exposes this capability.
    pub fn supported_by(&self, provider: &dyn ApiProvider) -> bool {
        match self {
            Self::Text => provider.as_text().is_some(),
            Self::Embedding => provider.as_embedding().is_some(),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the provider to use for `capability`.
///
/// - `None` returns `default`.
/// - An id or options are loaded through `loader` and returned as-is.
/// - An instance is returned when it supports `capability`, otherwise
///   `default` is returned. This is not an error.
pub async fn get_grading_provider(
    capability: Capability,
    requested: Option<&ProviderRef>,
    default: &SharedProvider,
    loader: &dyn ProviderLoader,
) -> ProviderResult<SharedProvider> {
    let Some(requested) = requested else {
        return Ok(Arc::clone(default));
    };

    match requested {
        ProviderRef::Id(id) => loader.load_from_id(id).await,
        ProviderRef::Options(options) => loader.load_from_options(options).await,
        ProviderRef::Instance(provider) => {
            if capability.supported_by(provider.as_ref()) {
                Ok(Arc::clone(provider))
            } else {
                debug!(
                    provider_id = %provider.id(),
                    %capability,
                    "Provider instance lacks capability, using default"
                );
                Ok(Arc::clone(default))
            }
        }
    }
}

/// Like [`get_grading_provider`], but checks the resolved provider.
///
/// Whenever the resolved provider lacks `capability`, a warning naming
/// `check` is logged and `default` is returned.
pub async fn get_and_check_provider(
    capability: Capability,
    requested: Option<&ProviderRef>,
    default: &SharedProvider,
    check: &str,
    loader: &dyn ProviderLoader,
) -> ProviderResult<SharedProvider> {
    let provider = match requested {
        None => return Ok(Arc::clone(default)),
        Some(ProviderRef::Instance(provider)) => Arc::clone(provider),
        Some(other) => get_grading_provider(capability, Some(other), default, loader).await?,
    };

    if capability.supported_by(provider.as_ref()) {
        return Ok(provider);
    }

    warn!(
        provider_id = %provider.id(),
        %capability,
        check,
        "Provider {} is not a valid {} provider for '{}', falling back to default",
        provider.id(),
        capability,
        check
    );
    Ok(Arc::clone(default))
}
