//! Huginn - resilient AI analysis gateway with ordered provider fallback
//!
//! This crate sits between a chat application and several interchangeable
//! text-generation services. It accepts a text-analysis request and returns
//! a structured, quality-checked result with bounded latency, shielding
//! callers from upstream unreliability, rate limits, and inconsistent
//! output formats.
//!
//! A request flows through per-caller rate limiting, a content-addressed
//! response cache, and a priority-ordered provider fallback chain; every
//! candidate answer is scored (and, when possible, repaired) before it is
//! accepted. When everything fails, callers still get a deterministic
//! canned response rather than an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{AnalysisOutcome, AnalysisRequest, GatewayConfig, Huginn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> huginn::Result<()> {
//!     let config = GatewayConfig::load(None)?;
//!     let gateway = Huginn::from_config(&config)?;
//!
//!     let request = AnalysisRequest::new("Bitcoin ETF approved", "chat-123")
//!         .with_hint("regulation");
//!
//!     match gateway.analyze(&request).await? {
//!         AnalysisOutcome::Ready(analysis) => {
//!             println!("{} (via {})", analysis.summary, analysis.provider);
//!             for point in &analysis.impact_points {
//!                 println!("- {point}");
//!             }
//!         }
//!         AnalysisOutcome::Throttled { retry_after, .. } => {
//!             println!("slow down, retry after {retry_after:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod collector;
pub mod config;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod providers;
pub mod quality;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStats, ResponseCache};
pub use collector::{MetricsCollector, MetricsSnapshot, Outcome, ProviderMetrics};
pub use config::{GatewayConfig, ProviderSpec, QualitySettings, RateLimitSettings};
pub use error::{HuginnError, Result};
pub use gateway::{AnalysisOutcome, Huginn, HuginnBuilder};
pub use limiter::{RateDecision, RateLimiter};
pub use providers::{AnalysisProvider, ProviderRegistry, RetryConfig};
pub use quality::QualityValidator;

// Re-export all types
pub use types::{
    AnalysisRequest, AnalysisResponse, ContextTurn, HealthStatus, QualityScore, Role, Sentiment,
};
