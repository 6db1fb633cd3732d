//! Red-team generation errors.

use rubricate_prompts::PromptError;
use rubricate_providers::ProviderError;
use thiserror::Error;

/// Errors that can occur while generating test cases.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generating provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The generation template failed to render.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Plugin misconfiguration.
    #[error("Invalid plugin configuration: {0}")]
    Config(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GenerationError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;
