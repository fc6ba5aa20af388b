//! Builder for configuring gateway instances.

use std::sync::Arc;
use std::time::Duration;

use super::orchestrator::{DEFAULT_FALLBACK_SUMMARY, Huginn, ProviderEntry};
use crate::cache::{CacheConfig, ResponseCache};
use crate::collector::MetricsCollector;
use crate::config::{GatewayConfig, ProviderSpec, QualitySettings, RateLimitSettings};
use crate::limiter::RateLimiter;
use crate::providers::{AnalysisProvider, ProviderRegistry};
use crate::quality::QualityValidator;
use crate::{HuginnError, Result};

/// Builder for configuring gateway instances.
///
/// Providers come from configuration entries (constructed through the
/// registry, ordered by their `priority` field) or are added directly
/// as trait objects; direct additions keep call order and are placed
/// after configured ones.
pub struct HuginnBuilder {
    registry: ProviderRegistry,
    specs: Vec<ProviderSpec>,
    direct: Vec<ProviderEntry>,
    rate_limit: RateLimitSettings,
    cache: Option<CacheConfig>,
    quality: QualitySettings,
    collector: Option<Arc<MetricsCollector>>,
    max_text_chars: usize,
    fallback_summary: Option<String>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::with_builtins(),
            specs: Vec::new(),
            direct: Vec::new(),
            rate_limit: RateLimitSettings::default(),
            cache: Some(CacheConfig::default()),
            quality: QualitySettings::default(),
            collector: None,
            max_text_chars: crate::config::RequestSettings::default().max_text_chars,
            fallback_summary: None,
        }
    }

    /// Seed the builder from loaded configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut builder = Self::new();
        builder.specs = config.providers.clone();
        builder.rate_limit = config.rate_limit.clone();
        builder.cache = config.cache.enabled.then(|| {
            CacheConfig::new()
                .max_entries(config.cache.max_entries)
                .ttl(Duration::from_secs(config.cache.ttl_seconds))
        });
        builder.quality = config.quality.clone();
        builder.max_text_chars = config.request.max_text_chars;
        builder.fallback_summary = config.fallback_summary.clone();
        builder
    }

    /// Replace the provider registry (e.g. to add custom kinds).
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a provider configuration entry.
    pub fn provider_spec(mut self, spec: ProviderSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Add an already-constructed provider with a per-attempt timeout.
    pub fn provider(mut self, provider: Arc<dyn AnalysisProvider>, timeout: Duration) -> Self {
        self.direct.push(ProviderEntry { provider, timeout });
        self
    }

    /// Set the per-caller rate limit.
    pub fn rate_limit(mut self, max_requests: usize, window: Duration) -> Self {
        self.rate_limit = RateLimitSettings {
            max_requests,
            window_seconds: window.as_secs(),
        };
        self
    }

    /// Set the response cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Disable response caching entirely.
    pub fn no_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Set the quality validation settings.
    pub fn quality(mut self, settings: QualitySettings) -> Self {
        self.quality = settings;
        self
    }

    /// Share an externally-owned metrics collector (e.g. one exported
    /// by the host's monitoring endpoint).
    pub fn collector(mut self, collector: Arc<MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Set the maximum accepted request text length.
    pub fn max_text_chars(mut self, chars: usize) -> Self {
        self.max_text_chars = chars;
        self
    }

    /// Set the canned summary returned on total exhaustion.
    pub fn fallback_summary(mut self, summary: impl Into<String>) -> Self {
        self.fallback_summary = Some(summary.into());
        self
    }

    /// Build the gateway.
    pub fn build(mut self) -> Result<Huginn> {
        // Stable sort: equal priorities keep declaration order.
        self.specs.sort_by_key(|spec| spec.priority);

        let mut providers = Vec::with_capacity(self.specs.len() + self.direct.len());
        for spec in &self.specs {
            let provider = self.registry.create(spec)?;
            providers.push(ProviderEntry {
                provider,
                timeout: spec.timeout(),
            });
        }
        providers.extend(self.direct);

        if providers.is_empty() {
            return Err(HuginnError::NoProvider);
        }

        let limiter = RateLimiter::new(self.rate_limit.max_requests, self.rate_limit.window());
        let cache = self.cache.as_ref().map(ResponseCache::new);
        let validator = QualityValidator::new(self.quality);
        let collector = self
            .collector
            .unwrap_or_else(|| Arc::new(MetricsCollector::new()));

        Ok(Huginn::new(
            providers,
            limiter,
            cache,
            validator,
            collector,
            self.max_text_chars,
            self.fallback_summary
                .unwrap_or_else(|| DEFAULT_FALLBACK_SUMMARY.to_string()),
        ))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
