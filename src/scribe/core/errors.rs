//! Error types for the scribe subsystem.

use thiserror::Error;

/// Scribe subsystem error type.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// Invalid configuration or missing credentials.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Report delivery failure.
    #[error("delivery failed: {0}")]
    Delivery(String),
    /// The runtime command queue is closed.
    #[error("scribe runtime is not running")]
    RuntimeClosed,
    /// HTTP client construction error.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// HTTP client error from Rig.
    #[error("llm client error: {0}")]
    LlmClient(#[from] rig::http_client::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for scribe operations.
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Failure reported by an external summarization backend.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// Network or transport failure.
    #[error("network error: {0}")]
    Network(String),
    /// The call exceeded the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    /// The service rejected the call for rate limiting.
    #[error("rate limited by the summarization service")]
    RateLimited,
    /// Non-success HTTP status.
    #[error("summarization service returned HTTP {0}")]
    HttpStatus(u16),
    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Completion error from the Rig provider.
    #[error("completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),
}

impl SummarizationError {
    /// Whether a later attempt with the same input could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited | Self::HttpStatus(500..=599)
        )
    }
}

impl From<reqwest::Error> for SummarizationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Network(format!("timed out: {err}"));
        }
        if err.is_decode() {
            return Self::MalformedResponse(err.to_string());
        }
        if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                return Self::RateLimited;
            }
            return Self::HttpStatus(status.as_u16());
        }
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SummarizationError::Timeout(30).is_transient());
        assert!(SummarizationError::RateLimited.is_transient());
        assert!(SummarizationError::HttpStatus(503).is_transient());
        assert!(!SummarizationError::HttpStatus(401).is_transient());
        assert!(!SummarizationError::MalformedResponse("x".to_string()).is_transient());
    }

    #[test]
    fn test_error_messages_carry_reason() {
        assert_eq!(
            SummarizationError::HttpStatus(502).to_string(),
            "summarization service returned HTTP 502"
        );
        assert_eq!(
            SummarizationError::Timeout(120).to_string(),
            "request timed out after 120 seconds"
        );
        assert_eq!(
            ScribeError::Delivery("webhook returned HTTP 500".to_string()).to_string(),
            "delivery failed: webhook returned HTTP 500"
        );
    }
}
