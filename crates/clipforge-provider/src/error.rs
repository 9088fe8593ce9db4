//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur while talking to the provider or fetching artifacts.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Prediction {id} ended with status '{status}': {error}")]
    PredictionFailed {
        id: String,
        status: String,
        error: String,
    },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Remote artifact is empty")]
    EmptyPayload,

    #[error("Operation timed out")]
    Timeout,
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create error from HTTP status code, truncating the body for logs.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let body: String = body.chars().take(300).collect();
        Self::HttpStatus { status, body }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RequestFailed(_) | ProviderError::Timeout => true,
            ProviderError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ProviderError::from_http_status(503, "busy").is_retryable());
        assert!(ProviderError::from_http_status(429, "slow down").is_retryable());
        assert!(!ProviderError::from_http_status(404, "gone").is_retryable());
        assert!(!ProviderError::EmptyPayload.is_retryable());
        assert!(ProviderError::Timeout.is_retryable());
    }

    #[test]
    fn test_status_body_truncated() {
        let body = "x".repeat(1000);
        let ProviderError::HttpStatus { body, .. } = ProviderError::from_http_status(500, &body)
        else {
            panic!("expected HttpStatus");
        };
        assert_eq!(body.len(), 300);
    }
}
