//! Named prompt integrations.
//!
//! A prompt whose raw text is a single `scheme://spec` token is fetched from
//! the integration registered for `scheme` instead of being templated.

use crate::error::{PromptError, PromptResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use rubricate_core::Vars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Schemes that never name an integration.
const RESERVED_SCHEMES: &[&str] = &["file", "http", "https"];

/// Prompt returned by an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPrompt {
    /// Prompt messages in whatever shape the integration produces.
    pub messages: Value,
}

impl IntegrationPrompt {
    /// Wrap a messages value.
    pub fn new(messages: impl Into<Value>) -> Self {
        Self {
            messages: messages.into(),
        }
    }
}

/// An external prompt source addressed by scheme.
#[async_trait]
pub trait PromptIntegration: Send + Sync {
    /// Fetch the prompt identified by `spec` (the part after `://`).
    async fn get_prompt(&self, spec: &str, vars: &Vars) -> PromptResult<IntegrationPrompt>;
}

/// Registry of prompt integrations keyed by scheme.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: RwLock<HashMap<String, Arc<dyn PromptIntegration>>>,
}

impl IntegrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an integration for a scheme, replacing any existing one.
    pub fn register<I>(&self, scheme: impl Into<String>, integration: I)
    where
        I: PromptIntegration + 'static,
    {
        self.integrations
            .write()
            .insert(scheme.into(), Arc::new(integration));
    }

    /// Whether a scheme is registered.
    pub fn contains(&self, scheme: &str) -> bool {
        self.integrations.read().contains_key(scheme)
    }

    /// Registered schemes, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut schemes: Vec<_> = self.integrations.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Look up the integration for a scheme.
    pub fn get(&self, scheme: &str) -> PromptResult<Arc<dyn PromptIntegration>> {
        self.integrations
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| PromptError::UnknownIntegration {
                scheme: scheme.to_string(),
            })
    }

    /// Fetch a prompt through the integration for `scheme`.
    pub async fn get_prompt(
        &self,
        scheme: &str,
        spec: &str,
        vars: &Vars,
    ) -> PromptResult<IntegrationPrompt> {
        let integration = self.get(scheme)?;
        integration.get_prompt(spec, vars).await
    }
}

impl fmt::Debug for IntegrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationRegistry")
            .field("schemes", &self.list())
            .finish()
    }
}

/// Split a raw prompt into `(scheme, spec)` when it addresses an integration.
///
/// The trimmed prompt must be one whitespace-free `scheme://spec` token whose
/// scheme is alphanumeric (plus `-`, `_`, `.`) and not `file`, `http` or
/// `https`.
pub fn parse_integration(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim();
    if raw.contains(char::is_whitespace) {
        return None;
    }
    let (scheme, spec) = raw.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || RESERVED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some((scheme, spec))
}
