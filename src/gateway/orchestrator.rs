//! The fallback orchestrator: rate gate, cache gate, provider chain.
//!
//! One [`Huginn`] instance owns every piece of shared state (limiter,
//! cache, validator, collector) and is shared by reference across all
//! concurrent callers. A request moves through a fixed pipeline:
//!
//! 1. rate check — denial terminates with a [`AnalysisOutcome::Throttled`]
//!    before any provider is contacted or charged;
//! 2. cache lookup — a hit returns immediately;
//! 3. providers in priority order, each under its own timeout, each
//!    attempted at most once; responses are validated and, when invalid,
//!    repaired and re-validated once;
//! 4. on exhaustion, a deterministic canned response — callers always
//!    receive a usable result.
//!
//! Provider order is fixed at build time (cheapest/fastest first); health
//! information is exported for monitoring but never consulted mid-request,
//! which keeps the hot path deterministic and cheap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheStats, ResponseCache, cache_key};
use crate::collector::{MetricsCollector, MetricsSnapshot, Outcome};
use crate::limiter::RateLimiter;
use crate::providers::AnalysisProvider;
use crate::quality::QualityValidator;
use crate::telemetry;
use crate::types::{AnalysisRequest, AnalysisResponse, HealthStatus};
use crate::{HuginnError, Result};

/// Default summary of the canned response returned on total exhaustion.
pub const DEFAULT_FALLBACK_SUMMARY: &str =
    "Analysis is temporarily unavailable. Please try again shortly.";

/// Provider name attributed to the canned fallback response.
pub const FALLBACK_PROVIDER_NAME: &str = "fallback";

/// Caller-visible result of an analysis request.
///
/// Rate-limit denial is an expected outcome, not an error; everything
/// else resolves to a usable response (provider, cache, or canned).
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// An accepted analysis.
    Ready(AnalysisResponse),
    /// The caller exceeded its request quota for the current window.
    Throttled {
        remaining: usize,
        retry_after: Option<Duration>,
    },
}

/// Classification of a single provider attempt.
///
/// Modelled as data rather than control flow so the fallback loop is a
/// plain match instead of nested error handling.
enum AttemptOutcome {
    Accepted(AnalysisResponse),
    Timeout,
    Transport(HuginnError),
    Rejected(Vec<String>),
}

pub(crate) struct ProviderEntry {
    pub provider: Arc<dyn AnalysisProvider>,
    pub timeout: Duration,
}

/// The orchestration root. Cheap to share behind an `Arc`.
pub struct Huginn {
    providers: Vec<ProviderEntry>,
    limiter: RateLimiter,
    cache: Option<ResponseCache>,
    validator: QualityValidator,
    collector: Arc<MetricsCollector>,
    max_text_chars: usize,
    fallback_summary: String,
}

impl Huginn {
    /// Create a new builder for configuring a gateway instance.
    pub fn builder() -> super::builder::HuginnBuilder {
        super::builder::HuginnBuilder::new()
    }

    /// Build a gateway from loaded configuration with the built-in
    /// provider kinds.
    pub fn from_config(config: &crate::config::GatewayConfig) -> Result<Self> {
        super::builder::HuginnBuilder::from_config(config).build()
    }

    pub(crate) fn new(
        providers: Vec<ProviderEntry>,
        limiter: RateLimiter,
        cache: Option<ResponseCache>,
        validator: QualityValidator,
        collector: Arc<MetricsCollector>,
        max_text_chars: usize,
        fallback_summary: String,
    ) -> Self {
        Self {
            providers,
            limiter,
            cache,
            validator,
            collector,
            max_text_chars,
            fallback_summary,
        }
    }

    /// Run one analysis request through the pipeline.
    ///
    /// Fails only on invalid input; every provider-side failure is
    /// absorbed by the fallback chain. Cancelling (dropping) the
    /// returned future aborts whichever provider call is in flight —
    /// outbound requests never outlive the caller.
    #[instrument(skip(self, request), fields(caller = %request.caller_id))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(HuginnError::InvalidInput("empty request text".into()));
        }
        if request.text.chars().count() > self.max_text_chars {
            return Err(HuginnError::InvalidInput(format!(
                "request text exceeds {} characters",
                self.max_text_chars
            )));
        }

        let decision = self.limiter.allow(&request.caller_id);
        if !decision.permitted {
            metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
            debug!(retry_after = ?decision.retry_after, "request throttled");
            return Ok(AnalysisOutcome::Throttled {
                remaining: decision.remaining,
                retry_after: decision.retry_after,
            });
        }

        let key = cache_key(&request.text);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(key) {
                debug!(provider = hit.provider.as_str(), "cache hit");
                return Ok(AnalysisOutcome::Ready(hit));
            }
        }

        for entry in &self.providers {
            let name = entry.provider.name().to_string();
            let start = Instant::now();
            let outcome = self.attempt(entry, request).await;
            let elapsed = start.elapsed();

            match outcome {
                AttemptOutcome::Accepted(response) => {
                    self.collector.record(&name, Outcome::Success, elapsed);
                    if let Some(cache) = &self.cache {
                        cache.put(key, response.clone());
                    }
                    return Ok(AnalysisOutcome::Ready(response));
                }
                AttemptOutcome::Timeout => {
                    self.collector.record(&name, Outcome::Timeout, elapsed);
                    warn!(provider = name.as_str(), ?elapsed, "provider timed out");
                }
                AttemptOutcome::Transport(e) => {
                    self.collector
                        .record(&name, Outcome::TransportError, elapsed);
                    warn!(provider = name.as_str(), error = %e, "provider attempt failed");
                }
                AttemptOutcome::Rejected(issues) => {
                    self.collector.record(&name, Outcome::Rejected, elapsed);
                    warn!(
                        provider = name.as_str(),
                        issues = %issues.join("; "),
                        "response rejected by quality validation"
                    );
                }
            }
        }

        metrics::counter!(telemetry::EXHAUSTED_TOTAL).increment(1);
        warn!("all providers exhausted, returning canned fallback");
        Ok(AnalysisOutcome::Ready(self.fallback_response()))
    }

    /// One provider attempt: call under timeout, classify, validate,
    /// repair once if needed.
    async fn attempt(&self, entry: &ProviderEntry, request: &AnalysisRequest) -> AttemptOutcome {
        let result = tokio::time::timeout(entry.timeout, entry.provider.analyze(request)).await;

        let response = match result {
            Err(_) => return AttemptOutcome::Timeout,
            // A provider-internal timeout counts as a timeout, not a
            // generic transport failure.
            Ok(Err(HuginnError::Timeout { .. })) => return AttemptOutcome::Timeout,
            Ok(Err(e)) => return AttemptOutcome::Transport(e),
            Ok(Ok(response)) if response.is_empty() => {
                return AttemptOutcome::Transport(HuginnError::EmptyResponse);
            }
            Ok(Ok(response)) => response,
        };

        let score = self.validator.validate(&response);
        if score.is_valid {
            return AttemptOutcome::Accepted(response);
        }

        if let Some(fixed) = self.validator.fix(&response) {
            let rescored = self.validator.validate(&fixed);
            if rescored.is_valid {
                debug!(
                    provider = entry.provider.name(),
                    "response accepted after repair"
                );
                return AttemptOutcome::Accepted(fixed);
            }
            return AttemptOutcome::Rejected(rescored.issues);
        }
        AttemptOutcome::Rejected(score.issues)
    }

    fn fallback_response(&self) -> AnalysisResponse {
        AnalysisResponse {
            summary: self.fallback_summary.clone(),
            impact_points: Vec::new(),
            confidence: 0.0,
            sentiment: None,
            provider: FALLBACK_PROVIDER_NAME.to_string(),
            raw: None,
        }
    }

    /// Probe every provider concurrently.
    ///
    /// For external monitoring; the request path never reads this.
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        join_all(self.providers.iter().map(|entry| async {
            let name = entry.provider.name().to_string();
            let status = entry.provider.health_check().await;
            (name, status)
        }))
        .await
    }

    /// Provider names in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|entry| entry.provider.name())
            .collect()
    }

    /// Export the current metrics counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.collector.snapshot()
    }

    /// Current cache shape, when caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResponseCache::stats)
    }

    /// Drop the cached entry for a request text. Returns whether an
    /// entry was present.
    pub fn evict_cached(&self, text: &str) -> bool {
        match &self.cache {
            Some(cache) => cache.evict(cache_key(text)),
            None => false,
        }
    }
}
