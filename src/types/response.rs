//! Analysis response and health types

use serde::{Deserialize, Serialize};

/// Directional read of the analysed text, when the provider offers one.
///
/// Constrained set; anything else a provider emits is dropped during
/// repair rather than passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    /// Parse a provider-emitted label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "bullish" => Some(Sentiment::Bullish),
            "bearish" => Some(Sentiment::Bearish),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Unified result of a text analysis.
///
/// Produced by a provider, scored by the quality validator, returned to
/// the caller once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// One-paragraph summary of the analysed text.
    pub summary: String,
    /// Ordered market/impact observations.
    #[serde(default)]
    pub impact_points: Vec<String>,
    /// Provider- or extraction-assigned confidence in [0, 1].
    #[serde(default)]
    pub confidence: f32,
    /// Optional directional label as emitted by the provider. Scored
    /// against the [`Sentiment`] set; unrecognized labels are dropped
    /// during repair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// Name of the provider that produced this response.
    pub provider: String,
    /// Opaque provider payload, kept for diagnosis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl AnalysisResponse {
    /// Whether the response carries no usable content at all.
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.impact_points.is_empty()
    }
}

/// Result of a single health probe. Transient, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// A successful probe with the measured round-trip latency.
    pub fn healthy(latency_ms: f64) -> Self {
        Self {
            healthy: true,
            latency_ms,
            error: None,
        }
    }

    /// A failed probe carrying the observed error.
    pub fn unhealthy(latency_ms: f64, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            latency_ms,
            error: Some(error.into()),
        }
    }
}
