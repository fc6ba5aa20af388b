//! Quality score type

use serde::{Deserialize, Serialize};

/// Derived judgment of a response against the configured quality rules.
///
/// Computed fresh per response; a pure function of the payload and the
/// validator configuration, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// Cumulative rule score; starts from the baseline and moves down
    /// on penalties, up on bonuses.
    pub score: f32,
    /// Human-readable rule violations, in evaluation order.
    pub issues: Vec<String>,
    /// Whether the response clears both the score threshold and the
    /// issue-count cap.
    pub is_valid: bool,
    /// Confidence carried over from the scored response.
    pub confidence: f32,
}

impl QualityScore {
    /// An immediately-invalid score for a payload missing required structure.
    pub(crate) fn structural_failure(issue: impl Into<String>, confidence: f32) -> Self {
        Self {
            score: 0.0,
            issues: vec![issue.into()],
            is_valid: false,
            confidence,
        }
    }
}
