//! Retry configuration and the retrying provider decorator.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`RetryingProvider`], which wraps an [`AnalysisProvider`] with
//! automatic retry on transient errors. Delays are scheduled with
//! `tokio::time::sleep`, so a retrying attempt never blocks the thread
//! serving other callers.
//!
//! The registry applies the decorator at construction time when a
//! provider's configuration asks for more than one attempt; the
//! orchestrator itself still enters each provider exactly once per
//! request.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::AnalysisProvider;
use crate::config::RetrySettings;
use crate::telemetry;
use crate::types::{AnalysisRequest, AnalysisResponse, HealthStatus};
use crate::{HuginnError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with optional jitter.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
    /// Whether to spread delays with jitter. Default: true.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Build from the serde-facing settings struct.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_secs(settings.max_delay_secs),
            jitter: settings.jitter,
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Calculate the backoff delay for a given attempt number (0-indexed).
    ///
    /// Exponential: `initial_delay * 2^attempt`, capped at `max_delay`,
    /// plus up to 25% deterministic jitter keyed on the provider name
    /// and attempt so that synchronized callers fan out.
    pub fn delay_for_attempt(&self, provider: &str, attempt: u32) -> Duration {
        let base = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        if !self.jitter {
            return base;
        }
        let mut hasher = DefaultHasher::new();
        provider.hash(&mut hasher);
        attempt.hash(&mut hasher);
        let fraction = (hasher.finish() % 256) as f64 / 255.0;
        base + base.mul_f64(0.25 * fraction)
    }

    /// Effective delay, respecting an upstream `retry_after` hint.
    pub fn effective_delay(
        &self,
        provider: &str,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(provider, attempt))
    }
}

/// Execute an async operation with retry on transient errors.
///
/// Retries up to `config.max_attempts`, backing off exponentially and
/// honouring `retry_after` hints from upstream rate limits. Permanent
/// errors are returned immediately.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..config.max_attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                metrics::counter!(telemetry::RETRIES_TOTAL,
                    "provider" => provider_name.to_owned(),
                )
                .increment(1);
                if attempt + 1 < config.max_attempts {
                    let delay = config.effective_delay(provider_name, attempt, e.retry_after());
                    warn!(
                        provider = provider_name,
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // permanent error, no retry
        }
    }
    Err(last_err.unwrap_or(HuginnError::NoProvider))
}

/// Decorator that wraps an [`AnalysisProvider`] with retry logic.
///
/// `health_check` passes through unretried; a probe is supposed to
/// report the upstream's current state, not mask it.
pub struct RetryingProvider {
    inner: Arc<dyn AnalysisProvider>,
    config: RetryConfig,
}

impl RetryingProvider {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<dyn AnalysisProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl AnalysisProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        with_retry(&self.config, self.inner.name(), || {
            self.inner.analyze(request)
        })
        .await
    }

    async fn health_check(&self) -> HealthStatus {
        self.inner.health_check().await
    }
}
