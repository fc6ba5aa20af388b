//! Owned metrics state for the orchestration layer.
//!
//! Every provider attempt is recorded twice: into this collector's
//! atomic counters (the snapshot the monitoring endpoint exports) and
//! into the `metrics` facade under the names in [`crate::telemetry`]
//! (for whatever recorder the host process installs).
//!
//! Counters are purely additive; success rates and average latencies
//! are computed on read from the raw counts so there is no second
//! source of truth to drift. Readers may observe a snapshot that is
//! momentarily inconsistent across fields (one counter bumped a beat
//! before its sibling) — metrics here are advisory, not
//! correctness-critical.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::telemetry;

/// Classification of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Provider answered and the response was accepted.
    Success,
    /// The per-attempt timeout expired.
    Timeout,
    /// Transport-level failure (connection, non-2xx, empty body).
    TransportError,
    /// Provider answered but the response failed quality validation.
    Rejected,
}

impl Outcome {
    /// Stable label used for the `metrics` facade.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Timeout => "timeout",
            Outcome::TransportError => "error",
            Outcome::Rejected => "rejected",
        }
    }
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    successes: AtomicU64,
    errors: AtomicU64,
    timeouts: AtomicU64,
    rejections: AtomicU64,
    total_latency_micros: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: Outcome, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Outcome::Success => &self.successes,
            Outcome::Timeout => &self.timeouts,
            Outcome::TransportError => &self.errors,
            Outcome::Rejected => &self.rejections,
        }
        .fetch_add(1, Ordering::Relaxed);
        self.total_latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ProviderMetrics {
        let requests = self.requests.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let total_latency_micros = self.total_latency_micros.load(Ordering::Relaxed);
        ProviderMetrics {
            requests,
            successes,
            errors: self.errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            total_latency_ms: total_latency_micros as f64 / 1_000.0,
            average_latency_ms: if requests > 0 {
                total_latency_micros as f64 / 1_000.0 / requests as f64
            } else {
                0.0
            },
            success_rate: if requests > 0 {
                successes as f64 / requests as f64
            } else {
                0.0
            },
        }
    }
}

/// Per-provider counter readout with derived rates.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMetrics {
    pub requests: u64,
    pub successes: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub rejections: u64,
    pub total_latency_ms: f64,
    pub average_latency_ms: f64,
    pub success_rate: f64,
}

/// Read-only export of the collector's state.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub per_provider: BTreeMap<String, ProviderMetrics>,
    pub totals: ProviderMetrics,
    /// Milliseconds since the Unix epoch of the latest recorded attempt;
    /// zero when nothing has been recorded yet.
    pub last_updated_unix_ms: u64,
}

/// Process-wide attempt counters, one set per provider plus totals.
///
/// Constructed once at startup and shared by reference with every
/// component that records into it.
#[derive(Default)]
pub struct MetricsCollector {
    per_provider: RwLock<HashMap<String, Counters>>,
    totals: Counters,
    last_updated_unix_ms: AtomicU64,
}

impl MetricsCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one provider attempt.
    pub fn record(&self, provider: &str, outcome: Outcome, latency: Duration) {
        {
            let guard = self.per_provider.read().expect("collector lock poisoned");
            if let Some(counters) = guard.get(provider) {
                counters.record(outcome, latency);
            } else {
                drop(guard);
                let mut guard = self.per_provider.write().expect("collector lock poisoned");
                guard
                    .entry(provider.to_string())
                    .or_default()
                    .record(outcome, latency);
            }
        }
        self.totals.record(outcome, latency);
        self.last_updated_unix_ms
            .store(unix_millis_now(), Ordering::Relaxed);

        metrics::counter!(telemetry::ATTEMPTS_TOTAL,
            "provider" => provider.to_owned(),
            "outcome" => outcome.as_label(),
        )
        .increment(1);
        metrics::histogram!(telemetry::ATTEMPT_DURATION_SECONDS,
            "provider" => provider.to_owned(),
        )
        .record(latency.as_secs_f64());
    }

    /// Export current counters with derived rates computed on read.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let guard = self.per_provider.read().expect("collector lock poisoned");
        let per_provider = guard
            .iter()
            .map(|(name, counters)| (name.clone(), counters.snapshot()))
            .collect();
        MetricsSnapshot {
            per_provider,
            totals: self.totals.snapshot(),
            last_updated_unix_ms: self.last_updated_unix_ms.load(Ordering::Relaxed),
        }
    }
}

fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
