//! Per-caller sliding-window rate limiting.
//!
//! Tracks, per caller identity, the timestamps of recent requests within
//! a trailing window. On each check the window is pruned lazily, then the
//! request is admitted or denied in the same locked section, so two
//! concurrent requests from one caller can never both take the last slot.
//!
//! The limiter knows nothing about providers or caching; it is consulted
//! first by the orchestrator and charged nothing on denial.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub permitted: bool,
    /// Slots left in the window after this decision.
    pub remaining: usize,
    /// On denial, how long until the oldest tracked request ages out.
    pub retry_after: Option<Duration>,
}

/// Sliding-window rate limiter keyed by caller identity.
///
/// One coarse lock guards all windows; the critical section is a prune
/// plus a push, which is short enough that per-caller locks are not
/// justified at this layer's load.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per caller per `window`.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check and record a request from `caller_id`.
    pub fn allow(&self, caller_id: &str) -> RateDecision {
        self.allow_at(caller_id, Instant::now())
    }

    /// Number of distinct callers currently tracked.
    pub fn tracked_callers(&self) -> usize {
        self.windows.lock().expect("limiter lock poisoned").len()
    }

    fn allow_at(&self, caller_id: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        let timestamps = windows.entry(caller_id.to_string()).or_default();

        // Lazy prune: drop everything older than the window.
        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            let retry_after = timestamps
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)));
            return RateDecision {
                permitted: false,
                remaining: 0,
                retry_after,
            };
        }

        timestamps.push_back(now);
        RateDecision {
            permitted: true,
            remaining: self.max_requests - timestamps.len(),
            retry_after: None,
        }
    }
}
