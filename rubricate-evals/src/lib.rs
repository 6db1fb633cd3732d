//! # rubricate-evals
//!
//! Grading for rubricate: embedding similarity and LLM rubrics.
//!
//! ## Core Concepts
//!
//! - **[`Grader`]**: The dispatcher; resolves a capable provider, calls it and
//!   normalizes the answer into a [`GradingResult`](rubricate_core::GradingResult)
//! - **[`GradingConfig`]**: Per-call provider and rubric prompt overrides
//! - **[`RemoteGrader`]**: Remote rubric grading used by red-team runs
//!
//! ## Example
//!
//! ```ignore
//! use rubricate_evals::{Grader, GradingConfig};
//! use rubricate_core::Vars;
//!
//! let grader = Grader::from_env();
//!
//! let result = grader
//!     .matches_similarity("Expected output", "Sample output", 0.75, false, None)
//!     .await?;
//! println!("{}", result);
//!
//! let grading = GradingConfig::new().with_provider("openai:gpt-4o-mini");
//! let result = grader
//!     .matches_llm_rubric("Is polite", "Thank you!", Some(&grading), &Vars::new())
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod matchers;
pub mod remote;
pub mod rubric;
pub mod similarity;
pub mod usage;

// Re-exports
pub use config::{GradingConfig, DEFAULT_SIMILARITY_THRESHOLD};
pub use error::{EvalResult, GradingError};
pub use matchers::Grader;
pub use remote::{
    HttpRemoteGrader, RemoteGrader, RemoteGradingRequest, DEFAULT_REMOTE_GENERATION_URL,
    ENV_REMOTE_GENERATION_URL,
};
pub use rubric::{parse_grading_output, DEFAULT_GRADING_PROMPT};
pub use similarity::cosine_similarity;
pub use usage::tokens_used;
