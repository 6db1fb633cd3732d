//! Token usage attached to grading results.

use serde::{Deserialize, Serialize};

/// Tokens consumed while producing a grading result.
///
/// Every field defaults to zero when the provider does not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Total tokens.
    #[serde(default)]
    pub total: u64,
    /// Prompt tokens.
    #[serde(default)]
    pub prompt: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion: u64,
    /// Tokens served from a provider cache.
    #[serde(default)]
    pub cached: u64,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts.
    #[must_use]
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            total: prompt + completion,
            prompt,
            completion,
            cached: 0,
        }
    }

    /// Create an all-zero usage record.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Set the total explicitly.
    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    /// Set cached tokens.
    #[must_use]
    pub fn with_cached(mut self, cached: u64) -> Self {
        self.cached = cached;
        self
    }

    /// Add another record field by field.
    pub fn merge(&mut self, other: &TokenUsage) {
        self.total += other.total;
        self.prompt += other.prompt;
        self.completion += other.completion;
        self.cached += other.cached;
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.merge(&rhs);
        self
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
