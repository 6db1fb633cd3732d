//! Default grading and embedding providers.

use crate::provider::SharedProvider;
use std::sync::Arc;

/// Default text-grading model.
pub const DEFAULT_GRADING_MODEL: &str = "gpt-4o";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// The providers used when a grading config does not name one.
#[derive(Debug, Clone)]
pub struct DefaultProviders {
    /// Text-capable grading provider.
    pub grading: SharedProvider,
    /// Embedding-capable provider.
    pub embedding: SharedProvider,
}

impl DefaultProviders {
    /// Create a default set from explicit providers.
    pub fn new(grading: SharedProvider, embedding: SharedProvider) -> Self {
        Self { grading, embedding }
    }

    /// `openai:gpt-4o` for grading and `openai:embedding:text-embedding-3-large`
    /// for similarity.
    #[cfg(feature = "openai")]
    pub fn openai() -> Self {
        use crate::openai::{OpenAiChatProvider, OpenAiEmbeddingProvider};
        Self {
            grading: Arc::new(OpenAiChatProvider::new(DEFAULT_GRADING_MODEL)),
            embedding: Arc::new(OpenAiEmbeddingProvider::new(DEFAULT_EMBEDDING_MODEL)),
        }
    }

    /// Replace the grading provider.
    #[must_use]
    pub fn with_grading(mut self, provider: SharedProvider) -> Self {
        self.grading = provider;
        self
    }

    /// Replace the embedding provider.
    #[must_use]
    pub fn with_embedding(mut self, provider: SharedProvider) -> Self {
        self.embedding = provider;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    #[cfg(feature = "openai")]
    #[test]
    fn test_openai_defaults() {
        let defaults = DefaultProviders::openai();
        assert_eq!(defaults.grading.id(), "openai:gpt-4o");
        assert_eq!(
            defaults.embedding.id(),
            "openai:embedding:text-embedding-3-large"
        );
        assert!(defaults.grading.as_text().is_some());
        assert!(defaults.embedding.as_embedding().is_some());
    }

    #[test]
    fn test_override() {
        let grading: SharedProvider = Arc::new(MockProvider::text("mock:grader"));
        let embedding: SharedProvider = Arc::new(MockProvider::embedding("mock:embed"));
        let defaults = DefaultProviders::new(Arc::clone(&grading), embedding)
            .with_embedding(Arc::new(MockProvider::embedding("mock:other")));
        assert_eq!(defaults.grading.id(), "mock:grader");
        assert_eq!(defaults.embedding.id(), "mock:other");
    }
}
