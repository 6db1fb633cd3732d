//! Per-call grading configuration.

use rubricate_providers::ProviderRef;
use serde::Deserialize;

/// Similarity threshold used when a config does not set one.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Options for a single grading call.
///
/// Deserializes from the usual config shape:
///
/// ```json
/// {
///   "provider": {"id": "openai:gpt-4o-mini", "config": {"temperature": 0}},
///   "rubricPrompt": "file://prompts/rubric.json",
///   "threshold": 0.8
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingConfig {
    /// Provider override: an id, an options object, or an instance.
    #[serde(default)]
    pub provider: Option<ProviderRef>,
    /// Rubric prompt override, literal or `file://`.
    #[serde(default)]
    pub rubric_prompt: Option<String>,
    /// Similarity threshold.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Invert the similarity check.
    #[serde(default)]
    pub invert: bool,
}

impl GradingConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the grading provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<ProviderRef>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Override the rubric prompt.
    #[must_use]
    pub fn with_rubric_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.rubric_prompt = Some(prompt.into());
        self
    }

    /// Set the similarity threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Invert the similarity check.
    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Threshold, or the default.
    pub fn threshold_or_default(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_provider() {
        let config: GradingConfig =
            serde_json::from_str(r#"{"provider": "openai:gpt-4o-mini", "rubricPrompt": "Grading prompt"}"#)
                .unwrap();
        assert!(matches!(config.provider, Some(ProviderRef::Id(ref id)) if id == "openai:gpt-4o-mini"));
        assert_eq!(config.rubric_prompt.as_deref(), Some("Grading prompt"));
        assert!(!config.invert);
    }

    #[test]
    fn test_deserialize_options_provider() {
        let config: GradingConfig = serde_json::from_value(serde_json::json!({
            "provider": {
                "id": "openai:embedding:text-embedding-ada-9999999",
                "config": {"apiKey": "abc123", "temperature": 3.1415926}
            },
            "threshold": 0.8,
            "invert": true
        }))
        .unwrap();
        match config.provider {
            Some(ProviderRef::Options(ref options)) => {
                assert_eq!(options.id, "openai:embedding:text-embedding-ada-9999999");
                assert_eq!(options.config["apiKey"], "abc123");
            }
            ref other => panic!("unexpected provider: {:?}", other),
        }
        assert_eq!(config.threshold_or_default(), 0.8);
        assert!(config.invert);
    }

    #[test]
    fn test_builder_defaults() {
        let config = GradingConfig::new().with_rubric_prompt("Custom prompt");
        assert!(config.provider.is_none());
        assert_eq!(config.threshold_or_default(), DEFAULT_SIMILARITY_THRESHOLD);
    }
}
