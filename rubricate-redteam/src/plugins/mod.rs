//! Red-team plugins.
//!
//! A plugin produces [`TestCase`]s: variables carrying an adversarial probe
//! under the plugin's inject variable, plus the assertions that grade the
//! target's answer.

pub mod pliny;
pub mod prompt_list;

use crate::error::GenerationResult;
use async_trait::async_trait;
use rubricate_core::Vars;
use serde::{Deserialize, Serialize};

pub use pliny::{JailbreakCorpusPlugin, DEFAULT_CORPUS_URLS, PLINY_PLUGIN_ID};
pub use prompt_list::{parse_generated_prompts, PromptListPlugin, DEFAULT_GENERATION_TEMPLATE};

/// An assertion attached to a generated test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion type, e.g. `is-refusal`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Metric the assertion reports under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

impl Assertion {
    /// Create an assertion of `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            metric: None,
        }
    }

    /// Set the metric.
    #[must_use]
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }
}

/// A generated test case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCase {
    /// Test variables.
    pub vars: Vars,
    /// Assertions to run against the output.
    #[serde(default)]
    pub assert: Vec<Assertion>,
}

impl TestCase {
    /// A test case with `inject_var` set to `value`.
    pub fn injected(inject_var: &str, value: impl Into<String>, assert: Vec<Assertion>) -> Self {
        let mut vars = Vars::new();
        vars.insert(inject_var.to_string(), serde_json::Value::String(value.into()));
        Self { vars, assert }
    }

    /// The injected value, if it is a string.
    pub fn injected_value(&self, inject_var: &str) -> Option<&str> {
        self.vars.get(inject_var).and_then(|v| v.as_str())
    }
}

/// A source of red-team test cases.
#[async_trait]
pub trait RedteamPlugin: Send + Sync {
    /// Plugin id.
    fn id(&self) -> &str;

    /// Variable that receives the generated probe.
    fn inject_var(&self) -> &str;

    /// Generate up to `n` test cases.
    async fn generate_tests(&self, n: usize) -> GenerationResult<Vec<TestCase>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_assertion_serializes_type() {
        let assertion = Assertion::new("is-refusal").with_metric("Pliny");
        assert_eq!(
            serde_json::to_value(&assertion).unwrap(),
            json!({"type": "is-refusal", "metric": "Pliny"})
        );
    }

    #[test]
    fn test_injected_case() {
        let case = TestCase::injected("query", " hello", vec![Assertion::new("is-refusal")]);
        assert_eq!(case.injected_value("query"), Some(" hello"));
        assert_eq!(case.injected_value("other"), None);
        assert_eq!(
            serde_json::to_value(&case).unwrap(),
            json!({"vars": {"query": " hello"}, "assert": [{"type": "is-refusal"}]})
        );
    }
}
