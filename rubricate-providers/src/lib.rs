//! # rubricate-providers
//!
//! Provider abstractions and capability-based provider resolution.
//!
//! ## Core Concepts
//!
//! - **[`ApiProvider`]**: Anything with an id; capabilities are optional
//! - **[`TextProvider`] / [`EmbeddingProvider`]**: The two capabilities
//!   graders rely on
//! - **[`ProviderRef`]**: How a grading config names a provider (id string,
//!   options object, or a ready instance)
//! - **[`ProviderRegistry`]**: Builds providers from `prefix:path` ids
//! - **[`get_grading_provider`] / [`get_and_check_provider`]**: Resolve a
//!   requested provider, falling back to a default when it lacks the needed
//!   capability
//!
//! ## Feature Flags
//!
//! - `openai` (default): OpenAI chat and embedding providers
//!
//! ## Example
//!
//! ```ignore
//! use rubricate_providers::{get_and_check_provider, global_registry, Capability, DefaultProviders, ProviderRef};
//!
//! let defaults = DefaultProviders::openai();
//! let requested = ProviderRef::from("openai:embedding:text-embedding-3-small");
//! let provider = get_and_check_provider(
//!     Capability::Embedding,
//!     Some(&requested),
//!     &defaults.embedding,
//!     "similarity check",
//!     global_registry(),
//! )
//! .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod capability;
pub mod defaults;
pub mod error;
pub mod mock;
pub mod provider;
pub mod registry;

#[cfg(feature = "openai")]
#[cfg_attr(docsrs, doc(cfg(feature = "openai")))]
pub mod openai;

// Re-exports
pub use capability::{get_and_check_provider, get_grading_provider, Capability};
pub use defaults::{DefaultProviders, DEFAULT_EMBEDDING_MODEL, DEFAULT_GRADING_MODEL};
pub use error::{ProviderError, ProviderResult};
pub use mock::MockProvider;
pub use provider::{
    ApiProvider, CallContext, EmbeddingProvider, EmbeddingResponse, ProviderOptions, ProviderRef,
    ProviderResponse, ProviderTokenUsage, SharedProvider, TextProvider,
};
pub use registry::{
    global_registry, split_provider_id, ProviderConstructor, ProviderLoader, ProviderRegistry,
    ProviderSpec,
};

#[cfg(feature = "openai")]
pub use openai::{OpenAiChatProvider, OpenAiConfig, OpenAiEmbeddingProvider};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ApiProvider, Capability, DefaultProviders, EmbeddingProvider, ProviderError,
        ProviderLoader, ProviderOptions, ProviderRef, ProviderRegistry, ProviderResult,
        SharedProvider, TextProvider,
    };
}
