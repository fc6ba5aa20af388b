//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("rate limited by upstream, retry after {retry_after:?}")]
    UpstreamRateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty response from provider")]
    EmptyResponse,

    // Configuration errors
    #[error("unknown provider kind: {0}")]
    UnknownProvider(String),

    #[error("no provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HuginnError {
    /// Whether this error is transient and worth retrying against the
    /// same provider.
    ///
    /// Permanent errors (bad credentials, invalid input, configuration)
    /// fail fast; everything transport-shaped is retryable.
    pub fn is_transient(&self) -> bool {
        match self {
            HuginnError::Http(_)
            | HuginnError::Timeout { .. }
            | HuginnError::UpstreamRateLimited { .. }
            | HuginnError::EmptyResponse => true,
            HuginnError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Retry-after hint carried by the error, if the upstream supplied one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginnError::UpstreamRateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        assert!(HuginnError::Http("connection refused".into()).is_transient());
        assert!(
            HuginnError::Timeout {
                elapsed: Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(HuginnError::UpstreamRateLimited { retry_after: None }.is_transient());
        assert!(HuginnError::EmptyResponse.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(
            HuginnError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );
        assert!(
            !HuginnError::Api {
                status: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn permanent_errors_are_not_transient() {
        assert!(!HuginnError::AuthenticationFailed.is_transient());
        assert!(!HuginnError::InvalidInput("empty".into()).is_transient());
        assert!(!HuginnError::UnknownProvider("x".into()).is_transient());
    }

    #[test]
    fn retry_after_only_from_upstream_hint() {
        let hinted = HuginnError::UpstreamRateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(hinted.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(HuginnError::EmptyResponse.retry_after(), None);
    }
}
