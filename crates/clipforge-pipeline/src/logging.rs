//! Structured generation logging.
//!
//! Provides consistent, structured logging for one generation request with
//! the request id and cache key attached to every event.

use clipforge_models::{FallbackReason, NormalizedPrompt};
use tracing::{error, info, warn, Span};

/// Generation logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct GenerationLogger {
    request_id: String,
    key: String,
}

impl GenerationLogger {
    /// Create a logger for one request against a normalized prompt.
    pub fn new(request_id: impl Into<String>, key: &NormalizedPrompt) -> Self {
        Self {
            request_id: request_id.into(),
            key: key.to_string(),
        }
    }

    pub fn log_start(&self) {
        info!(
            request_id = %self.request_id,
            key = %self.key,
            "Generation started"
        );
    }

    pub fn log_cache_hit(&self, path: &std::path::Path) {
        info!(
            request_id = %self.request_id,
            key = %self.key,
            path = %path.display(),
            "Cache hit"
        );
    }

    /// A cache entry points at a file that no longer exists.
    pub fn log_stale_entry(&self, path: &std::path::Path) {
        warn!(
            request_id = %self.request_id,
            key = %self.key,
            path = %path.display(),
            "Cached artifact missing on disk, regenerating"
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            key = %self.key,
            "Generation progress: {}", message
        );
    }

    pub fn log_fallback(&self, reason: &FallbackReason) {
        warn!(
            request_id = %self.request_id,
            key = %self.key,
            reason = reason.as_str(),
            "Falling back to sample artifact: {}", reason
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            key = %self.key,
            "Generation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            key = %self.key,
            "Generation error: {}", message
        );
    }

    pub fn log_completion(&self, outcome: &str, elapsed_secs: f64) {
        info!(
            request_id = %self.request_id,
            key = %self.key,
            outcome = outcome,
            elapsed_secs = elapsed_secs,
            "Generation completed"
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Span carrying the request id and key, for instrumenting futures.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generation",
            request_id = %self.request_id,
            key = %self.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_models::normalize;

    #[test]
    fn test_logger_fields() {
        let key = normalize("  A Calm   Forest ", 2000).unwrap();
        let logger = GenerationLogger::new("req-1", &key);

        assert_eq!(logger.request_id(), "req-1");
        assert_eq!(logger.key(), "a calm forest");
    }
}
