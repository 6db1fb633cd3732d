//! Prompt rendering errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading variables or rendering prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A `file://` variable points at a file type that cannot be loaded.
    #[error("Unsupported file type: {}", path.display())]
    UnsupportedFileType {
        /// Offending path.
        path: PathBuf,
    },

    /// A referenced file does not exist.
    #[error("File does not exist: {}", path.display())]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// No integration is registered for a prompt scheme.
    #[error("Unknown prompt integration: {scheme}")]
    UnknownIntegration {
        /// Scheme without `://`.
        scheme: String,
    },

    /// Template expansion failed.
    #[error("Template error: {0}")]
    Template(String),

    /// An integration handler failed.
    #[error("Integration '{scheme}' failed: {message}")]
    Integration {
        /// Integration scheme.
        scheme: String,
        /// Error message.
        message: String,
    },

    /// A script loader failed.
    #[error("Script error in {}: {message}", path.display())]
    Script {
        /// Script path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

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

impl PromptError {
    /// Create a template error.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create an integration error.
    pub fn integration(scheme: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Integration {
            scheme: scheme.into(),
            message: message.into(),
        }
    }
}

impl From<tera::Error> for PromptError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template(message)
    }
}

/// Result type for prompt operations.
pub type PromptResult<T> = Result<T, PromptError>;
