//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — provider name (e.g. "primary-chat", "backup")
//! - `outcome` — attempt classification: "success" | "timeout" | "error" | "rejected"

/// Total provider attempts dispatched by the orchestrator.
///
/// Labels: `provider`, `outcome`.
pub const ATTEMPTS_TOTAL: &str = "huginn_attempts_total";

/// Provider attempt duration in seconds.
///
/// Labels: `provider`.
pub const ATTEMPT_DURATION_SECONDS: &str = "huginn_attempt_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total requests denied by the caller rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "huginn_rate_limited_total";

/// Total requests that exhausted every provider and fell back to the
/// canned response.
pub const EXHAUSTED_TOTAL: &str = "huginn_exhausted_total";
