//! # Rubricate
//!
//! Grade LLM outputs, render prompts and generate red-team test cases.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rubricate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     rubricate::init_logging();
//!
//!     let grader = Grader::from_env();
//!     let result = grader
//!         .matches_llm_rubric("Is a polite greeting", "Hello there!", None, &Vars::new())
//!         .await?;
//!     println!("{} ({})", result.pass, result.reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Rubricate is organized as a workspace of focused crates:
//!
//! - [`core`]: Variables, grading results, token usage and run context
//! - [`providers`]: Provider traits, capability checks and the registry
//! - [`prompts`]: Prompt rendering, file variables and integrations
//! - [`evals`]: Similarity and rubric matchers
//! - [`redteam`]: Deduplicating generation loop and red-team plugins
//!
//! ## Logging
//!
//! Every crate logs through `tracing`. [`init_logging`] installs a formatting
//! subscriber filtered by `RUST_LOG`.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use tracing_subscriber::EnvFilter;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Variables, grading results and run context.
pub use rubricate_core as core;

/// Provider abstractions.
pub use rubricate_providers as providers;

/// Prompt rendering.
pub use rubricate_prompts as prompts;

/// Grading matchers.
pub use rubricate_evals as evals;

/// Red-team generation.
pub use rubricate_redteam as redteam;

// ============================================================================
// Type Re-exports
// ============================================================================

// Core
pub use rubricate_core::{
    resolve_variables, vars, GradingResult, RunContext, TokenUsage, Vars,
};

// Providers
pub use rubricate_providers::{
    get_and_check_provider, get_grading_provider, ApiProvider, Capability, DefaultProviders,
    EmbeddingProvider, ProviderError, ProviderOptions, ProviderRef, ProviderRegistry,
    SharedProvider, TextProvider,
};

#[cfg(feature = "openai")]
#[cfg_attr(docsrs, doc(cfg(feature = "openai")))]
pub use rubricate_providers::{OpenAiChatProvider, OpenAiEmbeddingProvider};

// Prompts
pub use rubricate_prompts::{Prompt, PromptError, PromptRenderer, TemplateEngine};

// Evals
pub use rubricate_evals::{cosine_similarity, Grader, GradingConfig, GradingError};

// Red team
pub use rubricate_redteam::{
    retry_with_deduplication, DedupRetry, GenerationError, RedteamPlugin, TestCase,
};

// ============================================================================
// Logging
// ============================================================================

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install a human-readable `tracing` subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_LOG_FILTER))
        .try_init()
        .is_ok()
}

/// Install a JSON `tracing` subscriber, one object per line.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json_logging() -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(DEFAULT_LOG_FILTER))
        .try_init()
        .is_ok()
}

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```ignore
/// use rubricate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiProvider, Capability, DedupRetry, DefaultProviders, EmbeddingProvider, Grader,
        GradingConfig, GradingError, GradingResult, Prompt, PromptRenderer, ProviderRef,
        ProviderRegistry, RedteamPlugin, RunContext, TestCase, TextProvider, TokenUsage, Vars,
    };
}
