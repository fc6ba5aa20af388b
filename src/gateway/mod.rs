//! Gateway assembly: builder and fallback orchestrator.

pub mod builder;
pub mod orchestrator;

pub use builder::HuginnBuilder;
pub use orchestrator::{
    AnalysisOutcome, DEFAULT_FALLBACK_SUMMARY, FALLBACK_PROVIDER_NAME, Huginn,
};
