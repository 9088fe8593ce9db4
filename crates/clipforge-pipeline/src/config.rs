//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use clipforge_models::DEFAULT_MAX_PROMPT_CHARS;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root for the cache index, artifacts and sessions
    pub data_dir: PathBuf,
    /// Artifact served when generation is unavailable or fails
    pub sample_asset: PathBuf,
    /// Maximum prompt length in characters
    pub max_prompt_chars: usize,
    /// Upper bound on one provider invocation
    pub provider_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_dir("./data")
    }
}

impl PipelineConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            sample_asset: data_dir.join("sample_assets").join("sample.mp4"),
            data_dir,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            provider_timeout: Duration::from_secs(600),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("CLIPFORGE_DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "./data".to_string());
        let mut config = Self::with_data_dir(data_dir);

        if let Some(sample) = std::env::var("SAMPLE_ASSET").ok().filter(|s| !s.is_empty()) {
            config.sample_asset = PathBuf::from(sample);
        }

        config.max_prompt_chars = std::env::var("MAX_PROMPT_CHARS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_PROMPT_CHARS);

        config.provider_timeout = Duration::from_secs(
            std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(600),
        );

        config
    }

    pub fn cache_index_path(&self) -> PathBuf {
        self.data_dir.join("cache.json")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.data_dir.join("generated_videos")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_data_dir() {
        let config = PipelineConfig::with_data_dir("/srv/clipforge");
        assert_eq!(config.cache_index_path(), PathBuf::from("/srv/clipforge/cache.json"));
        assert_eq!(config.artifacts_dir(), PathBuf::from("/srv/clipforge/generated_videos"));
        assert_eq!(config.sessions_dir(), PathBuf::from("/srv/clipforge/sessions"));
        assert_eq!(
            config.sample_asset,
            PathBuf::from("/srv/clipforge/sample_assets/sample.mp4")
        );
        assert_eq!(config.provider_timeout, Duration::from_secs(600));
        assert_eq!(config.max_prompt_chars, 2000);
    }
}
