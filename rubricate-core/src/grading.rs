//! The uniform grading result.

use crate::usage::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single grading call.
///
/// Created fresh by each grading call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Whether the output passed.
    pub pass: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Numeric score.
    pub score: f64,
    /// Tokens spent producing this result.
    #[serde(default)]
    pub tokens_used: TokenUsage,
}

impl GradingResult {
    /// Create a result with an explicit score.
    pub fn new(pass: bool, score: f64, reason: impl Into<String>) -> Self {
        Self {
            pass,
            reason: reason.into(),
            score,
            tokens_used: TokenUsage::default(),
        }
    }

    /// Create a passing result scored 1.
    pub fn pass(reason: impl Into<String>) -> Self {
        Self::new(true, 1.0, reason)
    }

    /// Create a failing result scored 0.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::new(false, 0.0, reason)
    }

    /// Create a result whose pass flag is `score >= threshold`.
    pub fn from_score(score: f64, threshold: f64, reason: impl Into<String>) -> Self {
        Self::new(score >= threshold, score, reason)
    }

    /// Attach token usage.
    #[must_use]
    pub fn with_tokens_used(mut self, usage: TokenUsage) -> Self {
        self.tokens_used = usage;
        self
    }
}

impl fmt::Display for GradingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.pass { "PASS" } else { "FAIL" };
        write!(f, "{} (score: {:.2}) - {}", verdict, self.score, self.reason)
    }
}
