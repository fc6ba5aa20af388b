//! Provider implementations and supporting machinery.

mod chat;
mod completion;
mod extract;
mod prompt;
pub mod registry;
pub mod retry;
pub mod traits;

pub use chat::ChatCompletionProvider;
pub use completion::TextCompletionProvider;
pub use registry::ProviderRegistry;
pub use retry::{RetryConfig, RetryingProvider};
pub use traits::AnalysisProvider;

use std::time::Duration;

use crate::{HuginnError, Result};

/// Map a non-success HTTP status to the matching error.
///
/// 429 extracts the `retry-after` header so the retry layer can honour
/// the upstream's hint instead of its own backoff.
pub(crate) async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(HuginnError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(HuginnError::UpstreamRateLimited { retry_after })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            let mut message: String = body.chars().take(200).collect();
            if message.is_empty() {
                message = format!("upstream returned {status}");
            }
            Err(HuginnError::Api {
                status: code,
                message,
            })
        }
    }
}
