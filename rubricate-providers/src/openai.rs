//! OpenAI-compatible chat and embedding providers.
//!
//! Ids understood by [`construct`]:
//!
//! - `openai:<model>`, `openai:chat:<model>`, `openai:completion:<model>`
//! - `openai:embedding:<model>`, `openai:embeddings:<model>`
//!
//! Provider config (the `config` object of [`ProviderOptions`]) may set
//! `apiKey`, `apiBaseUrl`, `temperature` and `maxTokens`. The key and base
//! URL fall back to `OPENAI_API_KEY` and `OPENAI_BASE_URL`.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    ApiProvider, CallContext, EmbeddingProvider, EmbeddingResponse, ProviderOptions,
    ProviderResponse, ProviderTokenUsage, SharedProvider, TextProvider,
};
use crate::registry::ProviderSpec;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration shared by the OpenAI providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum completion tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

impl OpenAiConfig {
    /// Parse config from a provider options object.
    pub fn from_options(options: &ProviderOptions) -> ProviderResult<Self> {
        Ok(serde_json::from_value(Value::Object(options.config.clone()))?)
    }

    /// API key from config or `OPENAI_API_KEY`.
    pub fn api_key(&self) -> ProviderResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(ProviderError::MissingApiKey("OPENAI_API_KEY"))
    }

    /// Base URL from config, `OPENAI_BASE_URL`, or the default.
    pub fn base_url(&self) -> String {
        self.api_base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

/// Build an OpenAI provider from a registry spec.
pub fn construct(spec: &ProviderSpec<'_>) -> ProviderResult<SharedProvider> {
    let config = match spec.options {
        Some(options) => OpenAiConfig::from_options(options)?,
        None => OpenAiConfig::default(),
    };
    let explicit_id = spec.options.map(|o| o.id.clone());

    let (kind, model) = match spec.path.split_once(':') {
        Some((kind, model)) => (kind, model),
        None => ("chat", spec.path),
    };
    if model.is_empty() {
        return Err(ProviderError::InvalidProviderId(spec.id.to_string()));
    }

    let provider: SharedProvider = match kind {
        "chat" | "completion" => {
            let mut p = OpenAiChatProvider::new(model).with_config(config);
            if let Some(id) = explicit_id {
                p = p.with_id(id);
            }
            Arc::new(p)
        }
        "embedding" | "embeddings" => {
            let mut p = OpenAiEmbeddingProvider::new(model).with_config(config);
            if let Some(id) = explicit_id {
                p = p.with_id(id);
            }
            Arc::new(p)
        }
        other => {
            return Err(ProviderError::config(format!(
                "Unknown OpenAI provider type '{}' in '{}'",
                other, spec.id
            )))
        }
    };
    Ok(provider)
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl From<OpenAiUsage> for ProviderTokenUsage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            total: usage.total_tokens,
            prompt: usage.prompt_tokens,
            completion: usage.completion_tokens,
            cached: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

/// Turn a prompt into chat messages.
///
/// A prompt that is a JSON array of `{role, content}` objects is used as the
/// message list; anything else becomes a single user message.
fn parse_chat_prompt(prompt: &str) -> Vec<ChatMessage> {
    let trimmed = prompt.trim_start();
    if trimmed.starts_with('[') {
        if let Ok(messages) = serde_json::from_str::<Vec<ChatMessage>>(trimmed) {
            return messages;
        }
    }
    vec![ChatMessage {
        role: "user".to_string(),
        content: prompt.to_string(),
    }]
}

async fn post_json<Req, Resp>(
    client: &Client,
    url: String,
    api_key: &str,
    body: &Req,
) -> ProviderResult<Resp>
where
    Req: Serialize + ?Sized,
    Resp: for<'de> Deserialize<'de>,
{
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if let Ok(error) = serde_json::from_str::<OpenAiErrorResponse>(&body) {
            return Err(ProviderError::Api(error.error.message));
        }
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

/// OpenAI chat completion provider.
#[derive(Clone)]
pub struct OpenAiChatProvider {
    id: String,
    model: String,
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiChatProvider {
    /// Create a provider for `model` with id `openai:<model>`.
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            id: format!("openai:{}", model),
            model,
            config: OpenAiConfig::default(),
            client: Client::new(),
        }
    }

    /// Override the reported id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OpenAiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = Some(url.into());
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Provider configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

impl std::fmt::Debug for OpenAiChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatProvider")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("temperature", &self.config.temperature)
            .finish()
    }
}

impl ApiProvider for OpenAiChatProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_text(&self) -> Option<&dyn TextProvider> {
        Some(self)
    }
}

#[async_trait]
impl TextProvider for OpenAiChatProvider {
    async fn call_api(
        &self,
        prompt: &str,
        _context: Option<&CallContext>,
    ) -> ProviderResult<ProviderResponse> {
        let api_key = self.config.api_key()?;
        let request = ChatRequest {
            model: &self.model,
            messages: parse_chat_prompt(prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(provider_id = %self.id, messages = request.messages.len(), "Calling chat completion");
        let url = format!("{}/chat/completions", self.config.base_url());
        let response: ChatResponse = post_json(&self.client, url, &api_key, &request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::api("No completion content returned"))?;

        let mut result = ProviderResponse::text(content);
        result.token_usage = response.usage.map(Into::into);
        Ok(result)
    }
}

/// OpenAI embedding provider.
#[derive(Clone)]
pub struct OpenAiEmbeddingProvider {
    id: String,
    model: String,
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiEmbeddingProvider {
    /// Create a provider for `model` with id `openai:embedding:<model>`.
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            id: format!("openai:embedding:{}", model),
            model,
            config: OpenAiConfig::default(),
            client: Client::new(),
        }
    }

    /// Override the reported id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OpenAiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = Some(url.into());
        self
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Provider configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("id", &self.id)
            .field("model", &self.model)
            .finish()
    }
}

impl ApiProvider for OpenAiEmbeddingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_embedding(&self) -> Option<&dyn EmbeddingProvider> {
        Some(self)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn call_embedding_api(&self, text: &str) -> ProviderResult<EmbeddingResponse> {
        let api_key = self.config.api_key()?;
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let url = format!("{}/embeddings", self.config.base_url());
        let response: EmbeddingApiResponse =
            post_json(&self.client, url, &api_key, &request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::api("No embedding returned"))?;

        let mut result = EmbeddingResponse::new(embedding);
        result.token_usage = response.usage.map(Into::into);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderRegistry;
    use crate::ProviderLoader;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_chat_prompt_plain() {
        let messages = parse_chat_prompt("Grading prompt");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "Grading prompt");
    }

    #[test]
    fn test_parse_chat_prompt_messages() {
        let messages = parse_chat_prompt(
            r#"[{"role": "system", "content": "be strict"}, {"role": "user", "content": "hi"}]"#,
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
    }

    #[tokio::test]
    async fn test_string_id_normalizes() {
        let registry = ProviderRegistry::with_defaults();
        let provider = registry
            .load_from_id("openai:chat:gpt-4o-mini-foobar")
            .await
            .unwrap();
        assert_eq!(provider.id(), "openai:gpt-4o-mini-foobar");
        assert!(provider.as_text().is_some());

        let provider = registry.load_from_id("openai:chat:foo").await.unwrap();
        assert_eq!(provider.id(), "openai:foo");
    }

    #[tokio::test]
    async fn test_embedding_id() {
        let registry = ProviderRegistry::with_defaults();
        let provider = registry
            .load_from_id("openai:embedding:text-embedding-3-large")
            .await
            .unwrap();
        assert!(provider.as_embedding().is_some());
        assert!(provider.as_text().is_none());
    }

    #[test]
    fn test_options_keep_id_and_config() {
        let options = ProviderOptions::new("openai:chat:gpt-4o-mini-foobar")
            .with_config("apiKey", "abc123")
            .with_config("temperature", 3.1415926);
        let spec = ProviderSpec {
            id: &options.id,
            prefix: "openai",
            path: "chat:gpt-4o-mini-foobar",
            options: Some(&options),
        };
        let provider = construct(&spec).unwrap();
        assert_eq!(provider.id(), "openai:chat:gpt-4o-mini-foobar");

        let config = OpenAiConfig::from_options(&options).unwrap();
        assert_eq!(config.temperature, Some(3.1415926));
        assert_eq!(config.api_key().unwrap(), "abc123");
    }

    #[test]
    fn test_unknown_kind() {
        let spec = ProviderSpec {
            id: "openai:image:dall-e",
            prefix: "openai",
            path: "image:dall-e",
            options: None,
        };
        assert!(matches!(construct(&spec), Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = OpenAiChatProvider::new("gpt-4o").with_api_key("secret-key");
        let debug = format!("{:?}", provider);
        assert!(debug.contains("gpt-4o"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_chat_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer abc123"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "temperature": 0.0,
                "messages": [{"role": "user", "content": "Grading prompt"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"pass\": true}"}}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 5, "total_tokens": 10}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiChatProvider::new("gpt-4o").with_config(OpenAiConfig {
            api_key: Some("abc123".into()),
            api_base_url: Some(server.uri()),
            temperature: Some(0.0),
            max_tokens: None,
        });

        let response = provider.call_api("Grading prompt", None).await.unwrap();
        assert_eq!(response.output, "{\"pass\": true}");
        assert_eq!(response.token_usage, Some(ProviderTokenUsage::new(10, 5, 5)));
    }

    #[tokio::test]
    async fn test_chat_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiChatProvider::new("gpt-4o")
            .with_api_key("bad")
            .with_base_url(server.uri());
        let err = provider.call_api("hi", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api(ref m) if m.contains("Incorrect API key")));
    }

    #[tokio::test]
    async fn test_http_error_without_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new("text-embedding-3-large")
            .with_api_key("k")
            .with_base_url(server.uri());
        let err = provider.call_embedding_api("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_embedding_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"input": "Expected output"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0, 0.0], "index": 0}],
                "model": "text-embedding-3-large",
                "usage": {"prompt_tokens": 2, "total_tokens": 2}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiEmbeddingProvider::new("text-embedding-3-large")
            .with_api_key("k")
            .with_base_url(format!("{}/", server.uri()));
        let response = provider.call_embedding_api("Expected output").await.unwrap();
        assert_eq!(response.embedding, vec![1.0, 0.0, 0.0]);
        let usage = response.token_usage.unwrap();
        assert_eq!(usage.total, Some(2));
        assert_eq!(usage.completion, None);
    }
}
