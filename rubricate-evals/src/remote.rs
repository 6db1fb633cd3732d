//! Remote grading service.

use crate::error::{EvalResult, GradingError};
use async_trait::async_trait;
use reqwest::Client;
use rubricate_core::{GradingResult, Vars};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable overriding the remote task endpoint.
pub const ENV_REMOTE_GENERATION_URL: &str = "RUBRICATE_REMOTE_GENERATION_URL";

/// Default remote task endpoint.
pub const DEFAULT_REMOTE_GENERATION_URL: &str = "https://api.rubricate.dev/api/v1/task";

/// A grading task sent to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGradingRequest {
    /// Task name, e.g. `llm-rubric`.
    pub task: String,
    /// Rubric text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
    /// Output under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Test variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Vars>,
}

impl RemoteGradingRequest {
    /// An `llm-rubric` task.
    pub fn llm_rubric(rubric: impl Into<String>, output: impl Into<String>, vars: Vars) -> Self {
        Self {
            task: "llm-rubric".to_string(),
            rubric: Some(rubric.into()),
            output: Some(output.into()),
            vars: Some(vars),
        }
    }
}

/// Something that grades on behalf of the local providers.
#[async_trait]
pub trait RemoteGrader: Send + Sync {
    /// Grade a task remotely.
    async fn grade(&self, request: &RemoteGradingRequest) -> EvalResult<GradingResult>;
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    result: Option<GradingResult>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the remote task endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemoteGrader {
    url: String,
    client: Client,
}

impl HttpRemoteGrader {
    /// Create a client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    /// Endpoint from `RUBRICATE_REMOTE_GENERATION_URL`, or the default.
    pub fn from_env() -> Self {
        let url = std::env::var(ENV_REMOTE_GENERATION_URL)
            .unwrap_or_else(|_| DEFAULT_REMOTE_GENERATION_URL.to_string());
        Self::new(url)
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteGrader for HttpRemoteGrader {
    async fn grade(&self, request: &RemoteGradingRequest) -> EvalResult<GradingResult> {
        debug!(url = %self.url, task = %request.task, "Sending remote grading task");
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| GradingError::remote(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GradingError::remote(e.to_string()))?;
        if !status.is_success() {
            return Err(GradingError::remote(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let parsed: RemoteResponse = serde_json::from_str(&body)?;
        match (parsed.result, parsed.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(GradingError::remote(error)),
            (None, None) => Err(GradingError::remote("response has no result")),
        }
    }
}
