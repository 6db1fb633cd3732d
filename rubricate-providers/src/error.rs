//! Provider errors.

use thiserror::Error;

/// Errors raised while loading or calling a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing API key.
    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),

    /// No constructor registered for the id's prefix.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider id could not be parsed.
    #[error("Invalid provider id: {0}")]
    InvalidProviderId(String),

    /// Provider configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP error from the provider API.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// API error reported by the provider.
    #[error("API error: {0}")]
    Api(String),

    /// Transport-level request failure.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider does not expose the requested capability.
    #[error("Provider '{provider}' does not support {capability}")]
    MissingCapability {
        /// Provider id.
        provider: String,
        /// Capability name.
        capability: &'static str,
    },

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Create an API error.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::api("API call failed");
        assert_eq!(err.to_string(), "API error: API call failed");
    }

    #[test]
    fn test_missing_capability_display() {
        let err = ProviderError::MissingCapability {
            provider: "echo".into(),
            capability: "embedding",
        };
        assert_eq!(err.to_string(), "Provider 'echo' does not support embedding");
    }
}
