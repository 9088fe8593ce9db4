//! Provider configuration.

use std::time::Duration;

/// Default model slug on the predictions API.
pub const DEFAULT_MODEL: &str = "minimax/video-01";

/// Default predictions API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Provider and fetch configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API token; the provider is unavailable when unset
    pub api_token: Option<String>,
    /// `owner/model` or `owner/model:version`
    pub model: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Delay between prediction status polls
    pub poll_interval: Duration,
    /// Per-request HTTP timeout for API calls
    pub request_timeout: Duration,
    /// Timeout for downloading a remote artifact
    pub fetch_timeout: Duration,
    /// Upper bound on downloaded artifact size
    pub max_artifact_bytes: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(180),
            max_artifact_bytes: 512 * 1024 * 1024,
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_token = std::env::var("REPLICATE_API_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let model = std::env::var("REPLICATE_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.model);

        let base_url = std::env::var("REPLICATE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let poll_interval = std::env::var("REPLICATE_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let request_timeout = std::env::var("REPLICATE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let fetch_timeout = std::env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);

        let max_artifact_bytes = std::env::var("MAX_ARTIFACT_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_artifact_bytes);

        Self {
            api_token,
            model,
            base_url,
            poll_interval,
            request_timeout,
            fetch_timeout,
            max_artifact_bytes,
        }
    }

    /// Whether a provider can be constructed from this config.
    pub fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconfigured() {
        let config = ProviderConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.model, "minimax/video-01");
        assert_eq!(config.max_artifact_bytes, 512 * 1024 * 1024);
    }
}
