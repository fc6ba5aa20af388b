//! Configuration loading for the gateway.
//!
//! Configuration is loaded once at startup from TOML, with the following
//! resolution order:
//! 1. explicit path (if provided)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! The gateway treats the loaded configuration as immutable for its
//! lifetime. API keys may be given inline or resolved from an
//! environment variable named per provider.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{HuginnError, Result};

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Providers in declaration order; sorted by `priority` at build time.
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub quality: QualitySettings,
    #[serde(default)]
    pub request: RequestSettings,
    /// Summary text of the canned response returned on total exhaustion.
    #[serde(default)]
    pub fallback_summary: Option<String>,
}

/// One upstream provider, as declared in configuration.
///
/// Immutable for the process lifetime; owned by the registry once the
/// gateway is built.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSpec {
    /// Unique display name, used in metrics and response attribution.
    pub name: String,
    /// Registry kind to construct ("chat", "completion", or a custom
    /// registration).
    pub kind: String,
    /// Base URL of the upstream service.
    pub endpoint: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Inline API key. Prefer `api_key_env` outside of tests.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable to read the API key from.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Per-attempt timeout, seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Lower value = tried earlier in the fallback chain.
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Marker tag delimiting the structured block in provider output
    /// (e.g. "analysis" for `<analysis>…</analysis>`). When absent, the
    /// first balanced brace region is scanned instead.
    #[serde(default)]
    pub block_marker: Option<String>,
    /// In-provider retry policy. Default: single attempt.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl ProviderSpec {
    /// Resolve the API key: inline value first, then the named env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
        })
    }

    /// Per-attempt timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_priority() -> u32 {
    100
}

/// In-provider retry policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the initial request. 1 = no retry.
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Base delay before the first retry, milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub initial_delay_ms: u64,
    /// Cap on the exponential backoff, seconds.
    #[serde(default = "default_retry_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Whether to add random jitter to delays.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            initial_delay_ms: default_retry_delay_ms(),
            max_delay_secs: default_retry_max_delay_secs(),
            jitter: default_true(),
        }
    }
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Caller rate limiting: sliding window per caller identity.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Admitted requests per window (default: 10).
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Window length in seconds (default: 60).
    #[serde(default = "default_window_secs")]
    pub window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_secs(),
        }
    }
}

impl RateLimitSettings {
    /// Window length as a duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

fn default_max_requests() -> usize {
    10
}

fn default_window_secs() -> u64 {
    60
}

/// Response cache bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of cached entries (default: 256).
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
    /// Entry time-to-live in seconds (default: 300).
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_entries: default_cache_entries(),
            ttl_seconds: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_entries() -> usize {
    256
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Quality validation thresholds and phrase lists.
///
/// Hand-tuned values; treat them as deployment configuration rather
/// than invariants.
#[derive(Debug, Clone, Deserialize)]
pub struct QualitySettings {
    /// Minimum cumulative score for validity (default: 0.6).
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// Maximum issue count for validity (default: 3).
    #[serde(default = "default_max_issues")]
    pub max_issues: usize,
    /// Summary length bounds, characters.
    #[serde(default = "default_min_summary_chars")]
    pub min_summary_chars: usize,
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
    /// Impact point count bounds.
    #[serde(default = "default_min_impact_points")]
    pub min_impact_points: usize,
    #[serde(default = "default_max_impact_points")]
    pub max_impact_points: usize,
    /// Maximum length of a single impact point, characters.
    #[serde(default = "default_max_point_chars")]
    pub max_point_chars: usize,
    /// Phrases penalised as non-committal filler.
    #[serde(default = "default_hedging_phrases")]
    pub hedging_phrases: Vec<String>,
    /// Phrases rewarded as concrete/specific language.
    #[serde(default = "default_specificity_phrases")]
    pub specificity_phrases: Vec<String>,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_issues: default_max_issues(),
            min_summary_chars: default_min_summary_chars(),
            max_summary_chars: default_max_summary_chars(),
            min_impact_points: default_min_impact_points(),
            max_impact_points: default_max_impact_points(),
            max_point_chars: default_max_point_chars(),
            hedging_phrases: default_hedging_phrases(),
            specificity_phrases: default_specificity_phrases(),
        }
    }
}

fn default_min_score() -> f32 {
    0.6
}

fn default_max_issues() -> usize {
    3
}

fn default_min_summary_chars() -> usize {
    10
}

fn default_max_summary_chars() -> usize {
    500
}

fn default_min_impact_points() -> usize {
    2
}

fn default_max_impact_points() -> usize {
    5
}

fn default_max_point_chars() -> usize {
    200
}

fn default_hedging_phrases() -> Vec<String> {
    [
        "it is difficult to say",
        "hard to predict",
        "time will tell",
        "it depends",
        "may or may not",
        "could go either way",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_specificity_phrases() -> Vec<String> {
    ["because", "driven by", "due to", "historically", "compared to"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Inbound request bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestSettings {
    /// Maximum request text length, characters (default: 4000).
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
        }
    }
}

fn default_max_text_chars() -> usize {
    4000
}

impl GatewayConfig {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(HuginnError::Configuration(
            "No config file found. Create ~/.huginn/config.toml or /etc/huginn/config.toml"
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = GatewayConfig::default();
        assert!(config.providers.is_empty());
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.cache.max_entries, 256);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.quality.min_impact_points, 2);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [[providers]]
            name = "primary"
            kind = "chat"
            endpoint = "https://api.example.com/v1"
            model = "fast-small"
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 1);
        let spec = &config.providers[0];
        assert_eq!(spec.name, "primary");
        assert_eq!(spec.timeout_secs, 30);
        assert_eq!(spec.priority, 100);
        assert_eq!(spec.retry.max_attempts, 1);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            fallback_summary = "No analysis available right now."

            [[providers]]
            name = "primary"
            kind = "chat"
            endpoint = "https://api.fast.example/v1"
            model = "fast-small"
            priority = 0
            timeout_secs = 10
            block_marker = "analysis"

            [providers.retry]
            max_attempts = 3
            initial_delay_ms = 200

            [[providers]]
            name = "backup"
            kind = "completion"
            endpoint = "https://api.slow.example"
            model = "big-accurate"
            priority = 10

            [rate_limit]
            max_requests = 5
            window_seconds = 30

            [cache]
            max_entries = 64
            ttl_seconds = 120

            [quality]
            min_score = 0.5
            max_issues = 2

            [request]
            max_text_chars = 2000
        "#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].retry.max_attempts, 3);
        assert_eq!(
            config.providers[0].block_marker.as_deref(),
            Some("analysis")
        );
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.cache.ttl_seconds, 120);
        assert!((config.quality.min_score - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.request.max_text_chars, 2000);
        assert_eq!(
            config.fallback_summary.as_deref(),
            Some("No analysis available right now.")
        );
    }

    #[test]
    fn api_key_resolution_prefers_inline() {
        let spec = ProviderSpec {
            name: "p".into(),
            kind: "chat".into(),
            endpoint: "http://localhost".into(),
            model: "m".into(),
            api_key: Some("inline-key".into()),
            api_key_env: Some("HUGINN_TEST_UNSET_VAR".into()),
            timeout_secs: 30,
            priority: 100,
            block_marker: None,
            retry: RetrySettings::default(),
        };
        assert_eq!(spec.resolve_api_key(), Some("inline-key".to_string()));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = GatewayConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_reads_an_explicit_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[providers]]
            name = "primary"
            kind = "chat"
            endpoint = "https://api.example.com/v1"
            model = "fast-small"

            [rate_limit]
            max_requests = 3
            "#
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.providers[0].name, "primary");
        assert_eq!(config.rate_limit.max_requests, 3);
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "providers = not-valid-toml").unwrap();

        let result = GatewayConfig::load(Some(file.path()));
        assert!(matches!(result, Err(HuginnError::Configuration(_))));
    }
}
