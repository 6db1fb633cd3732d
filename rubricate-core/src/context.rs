//! Run context flags.
//!
//! The grading dispatcher and prompt renderer take a [`RunContext`] value
//! instead of reading process-wide state, so tests can flip each flag
//! independently. [`RunContext::from_env`] is the one place environment
//! variables are consulted.

use serde::{Deserialize, Serialize};

/// Environment variable marking the active run as a red-team run.
pub const ENV_REDTEAM: &str = "RUBRICATE_REDTEAM";
/// Environment variable disabling remote generation and grading.
pub const ENV_DISABLE_REMOTE_GENERATION: &str = "RUBRICATE_DISABLE_REMOTE_GENERATION";
/// Environment variable disabling template expansion.
pub const ENV_DISABLE_TEMPLATING: &str = "RUBRICATE_DISABLE_TEMPLATING";

/// Flags describing the active evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunContext {
    /// The run's test cases are adversarial probes.
    pub redteam: bool,
    /// Remote generation and grading may be used.
    pub remote_grading_enabled: bool,
    /// Templates are passed through verbatim.
    pub templating_disabled: bool,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            redteam: false,
            remote_grading_enabled: true,
            templating_disabled: false,
        }
    }
}

impl RunContext {
    /// Create a default context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load flags from environment variables.
    ///
    /// Looks for:
    /// - `RUBRICATE_REDTEAM`
    /// - `RUBRICATE_DISABLE_REMOTE_GENERATION`
    /// - `RUBRICATE_DISABLE_TEMPLATING`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load flags through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).is_some_and(|v| is_truthy(&v));
        Self {
            redteam: flag(ENV_REDTEAM),
            remote_grading_enabled: !flag(ENV_DISABLE_REMOTE_GENERATION),
            templating_disabled: flag(ENV_DISABLE_TEMPLATING),
        }
    }

    /// Mark the run as a red-team run.
    #[must_use]
    pub fn redteam(mut self, redteam: bool) -> Self {
        self.redteam = redteam;
        self
    }

    /// Allow or forbid remote grading.
    #[must_use]
    pub fn remote_grading(mut self, enabled: bool) -> Self {
        self.remote_grading_enabled = enabled;
        self
    }

    /// Disable or enable template expansion.
    #[must_use]
    pub fn templating_disabled(mut self, disabled: bool) -> Self {
        self.templating_disabled = disabled;
        self
    }

    /// Whether grading should go to the remote service.
    #[must_use]
    pub fn use_remote_grading(&self) -> bool {
        self.redteam && self.remote_grading_enabled
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
