//! The grading dispatcher.

use crate::config::GradingConfig;
use crate::error::EvalResult;
use crate::remote::{HttpRemoteGrader, RemoteGrader, RemoteGradingRequest};
use crate::rubric::{load_rubric_prompt, parse_grading_output, render_rubric_prompt, DEFAULT_GRADING_PROMPT};
use crate::similarity::cosine_similarity;
use crate::usage::tokens_used;
use rubricate_core::{GradingResult, RunContext, Vars};
use rubricate_prompts::{PassthroughEngine, SharedEngine, TeraEngine};
use rubricate_providers::{
    get_and_check_provider, Capability, DefaultProviders, ProviderLoader, ProviderRegistry,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Grades outputs by embedding similarity or by an LLM rubric.
///
/// Providers named in a [`GradingConfig`] are loaded through the grader's
/// [`ProviderLoader`]; anything missing the required capability falls back to
/// the matching entry of [`DefaultProviders`].
#[derive(Clone)]
pub struct Grader {
    loader: Arc<dyn ProviderLoader>,
    defaults: DefaultProviders,
    remote: Option<Arc<dyn RemoteGrader>>,
    env_remote: Arc<OnceLock<Arc<dyn RemoteGrader>>>,
    context: RunContext,
    engine: SharedEngine,
    base_path: PathBuf,
}

impl Grader {
    /// Create a grader.
    pub fn new(loader: Arc<dyn ProviderLoader>, defaults: DefaultProviders) -> Self {
        Self {
            loader,
            defaults,
            remote: None,
            env_remote: Arc::new(OnceLock::new()),
            context: RunContext::default(),
            engine: Arc::new(TeraEngine::new()),
            base_path: PathBuf::from("."),
        }
    }

    /// A grader using the built-in registry, the OpenAI defaults and the run
    /// context from the environment.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(ProviderRegistry::with_defaults()),
            DefaultProviders::openai(),
        )
        .with_context(RunContext::from_env())
    }

    /// Use a remote grader for red-team rubric grading.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteGrader>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Set the run context.
    #[must_use]
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    /// Use a different template engine for rubric prompts.
    #[must_use]
    pub fn with_engine(mut self, engine: SharedEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Resolve `file://` rubric prompts against `base_path`.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Run context.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Default providers.
    pub fn defaults(&self) -> &DefaultProviders {
        &self.defaults
    }

    fn engine(&self) -> SharedEngine {
        if self.context.templating_disabled {
            Arc::new(PassthroughEngine)
        } else {
            Arc::clone(&self.engine)
        }
    }

    /// The configured remote grader, or one built from the environment on
    /// first use and shared by clones of this grader.
    fn remote(&self) -> Arc<dyn RemoteGrader> {
        if let Some(remote) = &self.remote {
            return Arc::clone(remote);
        }
        Arc::clone(
            self.env_remote
                .get_or_init(|| Arc::new(HttpRemoteGrader::from_env())),
        )
    }

    /// Compare `output` to `expected` by embedding cosine similarity.
    ///
    /// Passes when similarity is at least `threshold`, or below it when
    /// `invert` is set. Both texts are embedded verbatim.
    pub async fn matches_similarity(
        &self,
        expected: &str,
        output: &str,
        threshold: f64,
        invert: bool,
        grading: Option<&GradingConfig>,
    ) -> EvalResult<GradingResult> {
        let provider = get_and_check_provider(
            Capability::Embedding,
            grading.and_then(|g| g.provider.as_ref()),
            &self.defaults.embedding,
            "similarity check",
            self.loader.as_ref(),
        )
        .await?;
        let embedder = provider.require_embedding()?;

        let (expected_embedding, output_embedding) = futures::try_join!(
            embedder.call_embedding_api(expected),
            embedder.call_embedding_api(output),
        )?;

        let similarity =
            cosine_similarity(&expected_embedding.embedding, &output_embedding.embedding)?;
        let usage = tokens_used(expected_embedding.token_usage, false)
            + tokens_used(output_embedding.token_usage, false);

        let above = similarity >= threshold;
        let pass = above != invert;
        let reason = format!(
            "Similarity {:.2} is {} threshold {}",
            similarity,
            if above { "greater than" } else { "less than" },
            threshold
        );
        debug!(provider_id = %provider.id(), similarity, threshold, invert, pass, "Similarity graded");

        Ok(GradingResult::new(pass, if pass { 1.0 } else { 0.0 }, reason).with_tokens_used(usage))
    }

    /// [`matches_similarity`](Self::matches_similarity) with threshold and
    /// inversion taken from `grading`.
    pub async fn grade_similarity(
        &self,
        expected: &str,
        output: &str,
        grading: &GradingConfig,
    ) -> EvalResult<GradingResult> {
        self.matches_similarity(
            expected,
            output,
            grading.threshold_or_default(),
            grading.invert,
            Some(grading),
        )
        .await
    }

    /// Grade `output` against a natural-language `rubric`.
    ///
    /// Red-team runs with remote grading enabled and no rubric prompt
    /// override are graded by the remote service; everything else is graded
    /// by a local text provider.
    pub async fn matches_llm_rubric(
        &self,
        rubric: &str,
        output: &str,
        grading: Option<&GradingConfig>,
        vars: &Vars,
    ) -> EvalResult<GradingResult> {
        let configured = grading
            .and_then(|g| g.rubric_prompt.as_deref())
            .filter(|prompt| !prompt.is_empty());
        let rubric_prompt = match configured {
            Some(prompt) => Some(load_rubric_prompt(prompt, &self.base_path).await?),
            None => None,
        };

        if rubric_prompt.is_none() && self.context.use_remote_grading() {
            debug!("Grading rubric remotely");
            let request = RemoteGradingRequest::llm_rubric(rubric, output, vars.clone());
            return self.remote().grade(&request).await;
        }

        let provider = get_and_check_provider(
            Capability::Text,
            grading.and_then(|g| g.provider.as_ref()),
            &self.defaults.grading,
            "llm-rubric check",
            self.loader.as_ref(),
        )
        .await?;
        debug!(provider_id = %provider.id(), "Grading rubric locally");

        let template = rubric_prompt.as_deref().unwrap_or(DEFAULT_GRADING_PROMPT);
        let prompt = render_rubric_prompt(self.engine().as_ref(), template, rubric, output, vars)?;

        let response = provider.require_text()?.call_api(&prompt, None).await?;
        let result = parse_grading_output(&response.output)?;
        Ok(result.with_tokens_used(tokens_used(response.token_usage, response.cached)))
    }
}

impl fmt::Debug for Grader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grader")
            .field("defaults", &self.defaults)
            .field("has_remote", &self.remote.is_some())
            .field("context", &self.context)
            .field("engine", &self.engine)
            .field("base_path", &self.base_path)
            .finish()
    }
}
