//! Prompt rendering.

use crate::error::PromptResult;
use crate::files::{file_reference, load_file_value, ScriptLoader};
use crate::integration::{parse_integration, IntegrationRegistry};
use crate::template::{PassthroughEngine, SharedEngine, TeraEngine};
use rubricate_core::{resolve_variables, RunContext, Vars};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A prompt template with a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Template text.
    pub raw: String,
    /// Human-readable label.
    pub label: String,
}

impl Prompt {
    /// Create a prompt.
    pub fn new(raw: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for Prompt {
    fn from(raw: &str) -> Self {
        Self::new(raw, raw)
    }
}

/// Renders prompts against test variables.
///
/// Rendering order:
///
/// 1. A raw prompt addressing an integration (`scheme://spec`) is fetched and
///    its messages returned as JSON text, with no templating.
/// 2. `file://` variables are replaced by the file contents.
/// 3. Variables are resolved against each other.
/// 4. The template is expanded by the engine.
#[derive(Clone)]
pub struct PromptRenderer {
    base_path: PathBuf,
    engine: SharedEngine,
    integrations: Arc<IntegrationRegistry>,
    scripts: Option<Arc<dyn ScriptLoader>>,
    context: RunContext,
}

impl PromptRenderer {
    /// Create a renderer resolving `file://` paths against `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            engine: Arc::new(TeraEngine::new()),
            integrations: Arc::new(IntegrationRegistry::new()),
            scripts: None,
            context: RunContext::default(),
        }
    }

    /// Use a different template engine.
    #[must_use]
    pub fn with_engine(mut self, engine: SharedEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Use an integration registry.
    #[must_use]
    pub fn with_integrations(mut self, integrations: Arc<IntegrationRegistry>) -> Self {
        self.integrations = integrations;
        self
    }

    /// Evaluate script variables with `loader`.
    #[must_use]
    pub fn with_script_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.scripts = Some(loader);
        self
    }

    /// Set the run context.
    #[must_use]
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    /// Base directory for `file://` references.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Integration registry.
    pub fn integrations(&self) -> &IntegrationRegistry {
        &self.integrations
    }

    /// The engine used for this run's context.
    pub fn engine(&self) -> SharedEngine {
        if self.context.templating_disabled {
            Arc::new(PassthroughEngine)
        } else {
            Arc::clone(&self.engine)
        }
    }

    /// Replace every `file://` string variable with the referenced content.
    pub async fn load_file_vars(&self, vars: &mut Vars) -> PromptResult<()> {
        for value in vars.values_mut() {
            let Some(reference) = value.as_str().and_then(file_reference) else {
                continue;
            };
            let reference = reference.to_string();
            *value = load_file_value(&self.base_path, &reference, self.scripts.as_deref()).await?;
        }
        Ok(())
    }

    /// Render `prompt` with `vars`.
    pub async fn render(&self, prompt: &Prompt, vars: &Vars) -> PromptResult<String> {
        if let Some((scheme, spec)) = parse_integration(&prompt.raw) {
            debug!(label = %prompt.label, scheme, "Rendering prompt from integration");
            let fetched = self.integrations.get_prompt(scheme, spec, vars).await?;
            return Ok(serde_json::to_string(&fetched.messages)?);
        }

        let mut vars = vars.clone();
        self.load_file_vars(&mut vars).await?;
        let resolved = resolve_variables(&vars);
        self.engine().render_string(&prompt.raw, &resolved)
    }
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new(".")
    }
}

impl fmt::Debug for PromptRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRenderer")
            .field("base_path", &self.base_path)
            .field("engine", &self.engine)
            .field("integrations", &self.integrations)
            .field("has_script_loader", &self.scripts.is_some())
            .field("context", &self.context)
            .finish()
    }
}
