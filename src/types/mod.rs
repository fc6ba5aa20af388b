//! Public types for the Huginn API.

mod quality;
mod request;
mod response;

pub use quality::QualityScore;
pub use request::{AnalysisRequest, ContextTurn, Role};
pub use response::{AnalysisResponse, HealthStatus, Sentiment};
