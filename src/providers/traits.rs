//! Provider trait for upstream text-generation services.
//!
//! Every upstream service is abstracted behind [`AnalysisProvider`].
//! This enables:
//! - Decorator patterns: `RetryingProvider<T>`
//! - Fallback chains: the orchestrator tries providers in priority order
//! - Registration of new service kinds without touching orchestration code
//!
//! # Failure semantics
//!
//! `analyze` fails ONLY on transport-level problems (timeout, non-2xx,
//! connection failure, empty body). A provider that answers with a
//! malformed or missing structured block must still return a best-effort
//! [`AnalysisResponse`] built from the raw text with `confidence`
//! lowered accordingly; deciding whether that answer is good enough is
//! the quality validator's job, not the provider's.

use async_trait::async_trait;

use crate::Result;
use crate::types::{AnalysisRequest, AnalysisResponse, HealthStatus};

/// A single upstream text-generation service.
///
/// Implementations perform exactly one outbound call per `analyze` and
/// normalize whatever comes back into the unified response shape.
/// Stateless except for lazily created network clients.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name for logging, metrics, and response attribution.
    fn name(&self) -> &str;

    /// Analyse the request text, returning a unified response.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse>;

    /// Probe the upstream service once.
    ///
    /// Never fails; transport problems are folded into an unhealthy
    /// status. Exposed for external monitoring only — the orchestrator
    /// does not consult health on the request path.
    async fn health_check(&self) -> HealthStatus;
}
