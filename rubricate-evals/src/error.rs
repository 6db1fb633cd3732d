//! Grading errors.

use rubricate_prompts::PromptError;
use rubricate_providers::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while grading.
#[derive(Debug, Error)]
pub enum GradingError {
    /// A referenced rubric file is missing.
    #[error("File does not exist: {}", path.display())]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The grading provider's output could not be read as a grade.
    #[error("Could not parse grading output ({reason}): {output}")]
    MalformedProviderOutput {
        /// Raw provider output.
        output: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The two embeddings have different lengths.
    #[error("Embedding dimensions differ: {expected} vs {output}")]
    EmbeddingDimensionMismatch {
        /// Length of the expected-text embedding.
        expected: usize,
        /// Length of the output embedding.
        output: usize,
    },

    /// The remote grading service failed.
    #[error("Remote grading failed: {0}")]
    Remote(String),

    /// Rendering the rubric prompt failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GradingError {
    /// Create a malformed output error.
    pub fn malformed(output: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedProviderOutput {
            output: output.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote grading error.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

/// Result type for grading operations.
pub type EvalResult<T> = Result<T, GradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_is_transparent() {
        let err: GradingError = ProviderError::Api("API call failed".into()).into();
        assert_eq!(err.to_string(), ProviderError::Api("API call failed".into()).to_string());
        assert!(err.to_string().contains("API call failed"));
    }

    #[test]
    fn test_file_not_found_message() {
        let err = GradingError::FileNotFound {
            path: PathBuf::from("path/to/external/rubric.txt"),
        };
        assert_eq!(
            err.to_string(),
            "File does not exist: path/to/external/rubric.txt"
        );
    }

    #[test]
    fn test_malformed() {
        let err = GradingError::malformed("not json", "no JSON object found");
        assert!(err.to_string().contains("no JSON object found"));
        assert!(err.to_string().contains("not json"));
    }
}
