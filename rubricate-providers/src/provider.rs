//! Provider capability traits and provider references.
//!
//! A provider is anything with an [`ApiProvider::id`]. What it can do is
//! expressed through two capability traits:
//!
//! - [`TextProvider`]: text completion via `call_api`
//! - [`EmbeddingProvider`]: embeddings via `call_embedding_api`
//!
//! A provider advertises a capability by returning `Some(self)` from
//! [`ApiProvider::as_text`] or [`ApiProvider::as_embedding`]. Callers check
//! those accessors rather than assuming a method exists.

use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use rubricate_core::Vars;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Token usage as reported by a provider; any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokenUsage {
    /// Total tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Prompt tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<u64>,
    /// Completion tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<u64>,
    /// Cached tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<u64>,
}

impl ProviderTokenUsage {
    /// Create usage with all three counts.
    #[must_use]
    pub fn new(total: u64, prompt: u64, completion: u64) -> Self {
        Self {
            total: Some(total),
            prompt: Some(prompt),
            completion: Some(completion),
            cached: None,
        }
    }
}

/// Response from a text completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    /// Model output. Usually a string; structured providers may return JSON.
    pub output: Value,
    /// Reported token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<ProviderTokenUsage>,
    /// Whether the response came from a cache.
    #[serde(default)]
    pub cached: bool,
}

impl ProviderResponse {
    /// Create a response with text output.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: Value::String(output.into()),
            token_usage: None,
            cached: false,
        }
    }

    /// Create a response with structured output.
    pub fn json(output: Value) -> Self {
        Self {
            output,
            token_usage: None,
            cached: false,
        }
    }

    /// Attach token usage.
    #[must_use]
    pub fn with_usage(mut self, usage: ProviderTokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    /// Mark as served from cache.
    #[must_use]
    pub fn cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

/// Response from an embedding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingResponse {
    /// The embedding vector.
    pub embedding: Vec<f64>,
    /// Reported token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<ProviderTokenUsage>,
}

impl EmbeddingResponse {
    /// Create a response from a vector.
    pub fn new(embedding: Vec<f64>) -> Self {
        Self {
            embedding,
            token_usage: None,
        }
    }

    /// Attach token usage.
    #[must_use]
    pub fn with_usage(mut self, usage: ProviderTokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }
}

/// Extra context passed alongside a prompt.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Variables the prompt was rendered with.
    pub vars: Vars,
    /// Label of the prompt, if any.
    pub prompt_label: Option<String>,
}

/// Base provider trait.
pub trait ApiProvider: Send + Sync + fmt::Debug {
    /// Provider id (e.g. "openai:gpt-4o").
    fn id(&self) -> &str;

    /// Optional display label.
    fn label(&self) -> Option<&str> {
        None
    }

    /// Text completion capability, if supported.
    fn as_text(&self) -> Option<&dyn TextProvider> {
        None
    }

    /// Embedding capability, if supported.
    fn as_embedding(&self) -> Option<&dyn EmbeddingProvider> {
        None
    }
}

/// Text completion capability.
#[async_trait]
pub trait TextProvider: ApiProvider {
    /// Complete a prompt.
    async fn call_api(
        &self,
        prompt: &str,
        context: Option<&CallContext>,
    ) -> ProviderResult<ProviderResponse>;
}

/// Embedding capability.
#[async_trait]
pub trait EmbeddingProvider: ApiProvider {
    /// Embed a single text.
    async fn call_embedding_api(&self, text: &str) -> ProviderResult<EmbeddingResponse>;
}

impl dyn ApiProvider {
    /// Get the text capability or fail with [`ProviderError::MissingCapability`].
    pub fn require_text(&self) -> ProviderResult<&dyn TextProvider> {
        self.as_text().ok_or_else(|| ProviderError::MissingCapability {
            provider: self.id().to_string(),
            capability: "text",
        })
    }

    /// Get the embedding capability or fail with [`ProviderError::MissingCapability`].
    pub fn require_embedding(&self) -> ProviderResult<&dyn EmbeddingProvider> {
        self.as_embedding()
            .ok_or_else(|| ProviderError::MissingCapability {
                provider: self.id().to_string(),
                capability: "embedding",
            })
    }
}

/// Shared, type-erased provider.
pub type SharedProvider = Arc<dyn ApiProvider>;

/// Structured provider options: an id plus provider-specific config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// Provider id.
    pub id: String,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Provider-specific configuration.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

impl ProviderOptions {
    /// Create options with an id and empty config.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set a config entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// A requested provider, in one of the three accepted forms.
#[derive(Debug, Clone)]
pub enum ProviderRef {
    /// A provider id string, resolved through a loader.
    Id(String),
    /// Structured options, instantiated through a loader.
    Options(ProviderOptions),
    /// An already-built provider, used as-is when capable.
    Instance(SharedProvider),
}

impl ProviderRef {
    /// Wrap a concrete provider.
    pub fn instance<P: ApiProvider + 'static>(provider: P) -> Self {
        Self::Instance(Arc::new(provider))
    }
}

impl From<&str> for ProviderRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ProviderRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<ProviderOptions> for ProviderRef {
    fn from(options: ProviderOptions) -> Self {
        Self::Options(options)
    }
}

impl From<SharedProvider> for ProviderRef {
    fn from(provider: SharedProvider) -> Self {
        Self::Instance(provider)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProviderRef {
    Id(String),
    Options(ProviderOptions),
}

impl<'de> Deserialize<'de> for ProviderRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawProviderRef::deserialize(deserializer)? {
            RawProviderRef::Id(id) => Self::Id(id),
            RawProviderRef::Options(options) => Self::Options(options),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_ref_from_string() {
        let r: ProviderRef = serde_json::from_str(r#""openai:gpt-4o""#).unwrap();
        assert!(matches!(r, ProviderRef::Id(ref id) if id == "openai:gpt-4o"));
    }

    #[test]
    fn test_provider_ref_from_options() {
        let r: ProviderRef = serde_json::from_str(
            r#"{"id": "openai:chat:gpt-4o-mini", "config": {"apiKey": "abc123"}}"#,
        )
        .unwrap();
        match r {
            ProviderRef::Options(options) => {
                assert_eq!(options.id, "openai:chat:gpt-4o-mini");
                assert_eq!(options.config["apiKey"], "abc123");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_require_capabilities() {
        let provider: SharedProvider = Arc::new(MockProvider::text("text-only"));
        assert!(provider.require_text().is_ok());
        let err = provider.require_embedding().unwrap_err();
        assert!(matches!(err, ProviderError::MissingCapability { capability: "embedding", .. }));
    }

    #[test]
    fn test_provider_response_builders() {
        let resp = ProviderResponse::text("hi")
            .with_usage(ProviderTokenUsage::new(3, 1, 2))
            .cached();
        assert_eq!(resp.output, Value::String("hi".into()));
        assert!(resp.cached);
        assert_eq!(resp.token_usage.unwrap().total, Some(3));
    }

    #[test]
    fn test_options_builder() {
        let options = ProviderOptions::new("openai:gpt-4o")
            .with_label("grader")
            .with_config("temperature", 0.2);
        assert_eq!(options.label.as_deref(), Some("grader"));
        assert_eq!(options.config["temperature"], 0.2);
    }
}
