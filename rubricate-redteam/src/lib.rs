//! # rubricate-redteam
//!
//! Test-case generation for red-team runs.
//!
//! ## Core Concepts
//!
//! - **[`retry_with_deduplication`]**: Calls a generator until enough unique
//!   items exist or it stops making progress
//! - **[`DedupRetry`]**: Builder over the same loop
//! - **[`RedteamPlugin`]**: Produces [`TestCase`]s for a target
//!
//! ## Built-in Plugins
//!
//! - **[`PromptListPlugin`]**: Asks an LLM for `Prompt:` lines
//! - **[`JailbreakCorpusPlugin`]**: Samples sections of published jailbreak
//!   corpora (`redteam:pliny`)
//!
//! ## Example
//!
//! ```ignore
//! use rubricate_redteam::{DedupRetry, JailbreakCorpusPlugin, RedteamPlugin};
//!
//! let ideas = DedupRetry::new(10)
//!     .max_consecutive_retries(3)
//!     .run(|| async { brainstorm().await.map(Some) })
//!     .await?;
//!
//! let cases = JailbreakCorpusPlugin::new("query").generate_tests(5).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod generation;
pub mod plugins;

// Re-exports
pub use error::{GenerationError, GenerationResult};
pub use generation::{
    dedup_by_value, retry_with_deduplication, retry_with_deduplication_state, sample_items,
    DedupRetry, GenerationState, DEFAULT_MAX_CONSECUTIVE_RETRIES, DEFAULT_MAX_SKIPPED,
};
pub use plugins::{
    parse_generated_prompts, Assertion, JailbreakCorpusPlugin, PromptListPlugin, RedteamPlugin,
    TestCase, DEFAULT_CORPUS_URLS, PLINY_PLUGIN_ID,
};
