//! Mock providers for testing.
//!
//! [`MockProvider`] can expose either capability or both. Text replies are
//! queued (the last queued reply repeats once the queue drains), embeddings
//! are looked up by input text, and every call is recorded.
//!
//! ```rust
//! use rubricate_providers::mock::MockProvider;
//! use rubricate_providers::ApiProvider;
//!
//! let provider = MockProvider::text("grader")
//!     .with_output(r#"{"pass": true, "reason": "ok"}"#);
//! assert!(provider.as_text().is_some());
//! assert!(provider.as_embedding().is_none());
//! ```

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    ApiProvider, CallContext, EmbeddingProvider, EmbeddingResponse, ProviderResponse,
    ProviderTokenUsage, TextProvider,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
enum MockReply {
    Response(ProviderResponse),
    Error(String),
}

/// A mock provider with configurable capabilities.
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    text_enabled: bool,
    embedding_enabled: bool,
    replies: Mutex<VecDeque<MockReply>>,
    last_reply: Mutex<Option<MockReply>>,
    embeddings: HashMap<String, Vec<f64>>,
    default_embedding: Option<Vec<f64>>,
    embedding_error: Option<String>,
    embedding_usage: Option<ProviderTokenUsage>,
    text_calls: Mutex<Vec<String>>,
    embedding_calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn with_capabilities(id: impl Into<String>, text: bool, embedding: bool) -> Self {
        Self {
            id: id.into(),
            text_enabled: text,
            embedding_enabled: embedding,
            replies: Mutex::new(VecDeque::new()),
            last_reply: Mutex::new(None),
            embeddings: HashMap::new(),
            default_embedding: None,
            embedding_error: None,
            embedding_usage: None,
            text_calls: Mutex::new(Vec::new()),
            embedding_calls: Mutex::new(Vec::new()),
        }
    }

    /// Text-only provider.
    pub fn text(id: impl Into<String>) -> Self {
        Self::with_capabilities(id, true, false)
    }

    /// Embedding-only provider.
    pub fn embedding(id: impl Into<String>) -> Self {
        Self::with_capabilities(id, false, true)
    }

    /// Provider with both capabilities.
    pub fn full(id: impl Into<String>) -> Self {
        Self::with_capabilities(id, true, true)
    }

    /// Provider with no capabilities at all.
    pub fn bare(id: impl Into<String>) -> Self {
        Self::with_capabilities(id, false, false)
    }

    /// Queue a text reply.
    #[must_use]
    pub fn with_response(self, response: ProviderResponse) -> Self {
        self.replies.lock().push_back(MockReply::Response(response));
        self
    }

    /// Queue a plain text reply.
    #[must_use]
    pub fn with_output(self, output: impl Into<String>) -> Self {
        self.with_response(ProviderResponse::text(output))
    }

    /// Queue a failing text call.
    #[must_use]
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(MockReply::Error(message.into()));
        self
    }

    /// Return `embedding` for `text`.
    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Vec<f64>) -> Self {
        self.embeddings.insert(text.into(), embedding);
        self
    }

    /// Return `embedding` for any text without a specific entry.
    #[must_use]
    pub fn with_default_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.default_embedding = Some(embedding);
        self
    }

    /// Fail every embedding call.
    #[must_use]
    pub fn with_embedding_error(mut self, message: impl Into<String>) -> Self {
        self.embedding_error = Some(message.into());
        self
    }

    /// Report this usage on every embedding call.
    #[must_use]
    pub fn with_embedding_usage(mut self, usage: ProviderTokenUsage) -> Self {
        self.embedding_usage = Some(usage);
        self
    }

    /// Prompts received by `call_api`, in order.
    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().clone()
    }

    /// Texts received by `call_embedding_api`, in order.
    pub fn embedding_calls(&self) -> Vec<String> {
        self.embedding_calls.lock().clone()
    }

    /// Number of `call_api` invocations.
    pub fn text_call_count(&self) -> usize {
        self.text_calls.lock().len()
    }

    /// Number of `call_embedding_api` invocations.
    pub fn embedding_call_count(&self) -> usize {
        self.embedding_calls.lock().len()
    }

    fn next_reply(&self) -> Option<MockReply> {
        let next = self.replies.lock().pop_front();
        let mut last = self.last_reply.lock();
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                Some(reply)
            }
            None => last.clone(),
        }
    }
}

impl ApiProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn as_text(&self) -> Option<&dyn TextProvider> {
        if self.text_enabled {
            Some(self)
        } else {
            None
        }
    }

    fn as_embedding(&self) -> Option<&dyn EmbeddingProvider> {
        if self.embedding_enabled {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn call_api(
        &self,
        prompt: &str,
        _context: Option<&CallContext>,
    ) -> ProviderResult<ProviderResponse> {
        self.text_calls.lock().push(prompt.to_string());
        match self.next_reply() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(message)) => Err(ProviderError::Api(message)),
            None => Err(ProviderError::api(format!(
                "mock provider '{}' has no queued response",
                self.id
            ))),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn call_embedding_api(&self, text: &str) -> ProviderResult<EmbeddingResponse> {
        self.embedding_calls.lock().push(text.to_string());
        if let Some(message) = &self.embedding_error {
            return Err(ProviderError::Api(message.clone()));
        }
        let embedding = self
            .embeddings
            .get(text)
            .or(self.default_embedding.as_ref())
            .cloned()
            .ok_or_else(|| ProviderError::api(format!("Unexpected input: {}", text)))?;
        let mut response = EmbeddingResponse::new(embedding);
        response.token_usage = self.embedding_usage;
        Ok(response)
    }
}
