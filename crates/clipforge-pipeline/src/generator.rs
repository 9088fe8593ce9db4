//! Generation orchestrator.
//!
//! One request moves through: normalize, cache check, provider invocation,
//! extraction, optional fetch, persist, cache store. Any failure after
//! validation except persisting the artifact itself ends in the fallback
//! sample instead of an error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clipforge_models::{
    normalize, FallbackReason, GenerationOptions, GenerationResult, NormalizedPrompt, Outcome,
    RemoteLocator, VideoFormat,
};
use clipforge_provider::{ArtifactFetcher, ProviderClient};
use clipforge_storage::{ArtifactCache, ArtifactStore};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::{extract, Extracted};
use crate::logging::GenerationLogger;
use crate::metrics::{record_cache_write_failure, record_generation};
use crate::single_flight::KeyedLocks;

/// Turns prompts into artifacts.
///
/// Shared across requests behind an `Arc`; all state is internally
/// synchronized.
pub struct Generator {
    config: PipelineConfig,
    cache: Arc<dyn ArtifactCache>,
    store: ArtifactStore,
    fetcher: Arc<dyn ArtifactFetcher>,
    flights: KeyedLocks<NormalizedPrompt>,
}

impl Generator {
    /// Create a generator. Artifacts go to `config.artifacts_dir()`.
    pub fn new(
        config: PipelineConfig,
        cache: Arc<dyn ArtifactCache>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        let store = ArtifactStore::new(config.artifacts_dir());
        Self {
            config,
            cache,
            store,
            fetcher,
            flights: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn ArtifactCache> {
        &self.cache
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Produce an artifact for `raw_prompt` under a fresh request id.
    pub async fn generate(
        &self,
        raw_prompt: &str,
        options: &GenerationOptions,
        provider: Option<&dyn ProviderClient>,
    ) -> PipelineResult<GenerationResult> {
        let request_id = Uuid::new_v4().simple().to_string();
        self.generate_with_request_id(&request_id, raw_prompt, options, provider)
            .await
    }

    /// Produce an artifact for `raw_prompt`, logging under the caller's
    /// request id.
    ///
    /// The raw prompt goes to the provider; its normalized form is the cache
    /// key. Concurrent requests for the same key run the provider at most
    /// once. Errors only on invalid input or when a produced artifact cannot
    /// be written to disk.
    pub async fn generate_with_request_id(
        &self,
        request_id: &str,
        raw_prompt: &str,
        options: &GenerationOptions,
        provider: Option<&dyn ProviderClient>,
    ) -> PipelineResult<GenerationResult> {
        let started = Instant::now();
        let key = normalize(raw_prompt, self.config.max_prompt_chars)?;

        let logger = GenerationLogger::new(request_id, &key);
        let span = logger.create_span();

        let (artifact_path, outcome) = self
            .run(raw_prompt, options, provider, &key, &logger)
            .instrument(span)
            .await?;

        let elapsed = started.elapsed();
        record_generation(&outcome, elapsed);
        logger.log_completion(outcome.as_str(), elapsed.as_secs_f64());

        Ok(GenerationResult {
            request_id: request_id.to_string(),
            artifact_path,
            outcome,
            elapsed,
        })
    }

    async fn run(
        &self,
        raw_prompt: &str,
        options: &GenerationOptions,
        provider: Option<&dyn ProviderClient>,
        key: &NormalizedPrompt,
        logger: &GenerationLogger,
    ) -> PipelineResult<(PathBuf, Outcome)> {
        logger.log_start();

        if let Some(path) = self.lookup_live(key, logger).await {
            return Ok((path, Outcome::Cached));
        }

        let _flight = self.flights.acquire(key.clone()).await;

        // Another request for this key may have finished while we waited.
        if let Some(path) = self.lookup_live(key, logger).await {
            return Ok((path, Outcome::Cached));
        }

        let (data, format) = match self.produce(raw_prompt, options, provider, logger).await {
            Ok(produced) => produced,
            Err(reason) => return Ok(self.fallback(reason, logger)),
        };

        let path = self
            .store
            .write(&data, format)
            .await
            .map_err(PipelineError::Persist)?;

        if let Err(e) = self.cache.store(key.clone(), path.clone()).await {
            record_cache_write_failure();
            logger.log_warning(&format!("cache index not persisted: {}", e));
        }

        Ok((path, Outcome::Generated))
    }

    /// Cache lookup that ignores entries whose file has disappeared.
    async fn lookup_live(
        &self,
        key: &NormalizedPrompt,
        logger: &GenerationLogger,
    ) -> Option<PathBuf> {
        let path = self.cache.lookup(key).await?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            logger.log_cache_hit(&path);
            Some(path)
        } else {
            logger.log_stale_entry(&path);
            None
        }
    }

    /// Invoke the provider and obtain artifact bytes.
    async fn produce(
        &self,
        raw_prompt: &str,
        options: &GenerationOptions,
        provider: Option<&dyn ProviderClient>,
        logger: &GenerationLogger,
    ) -> Result<(Vec<u8>, VideoFormat), FallbackReason> {
        let provider = provider.ok_or(FallbackReason::ProviderUnavailable)?;
        logger.log_progress(&format!("invoking provider '{}'", provider.name()));

        let timeout = self.config.provider_timeout;
        let response = match tokio::time::timeout(timeout, provider.invoke(raw_prompt, options)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(FallbackReason::ProviderFailed(e.to_string())),
            Err(_) => return Err(FallbackReason::Timeout(timeout.as_secs())),
        };
        debug!(kind = response.kind(), "Provider responded");

        match extract(response)
            .await
            .map_err(|e| FallbackReason::Extraction(e.to_string()))?
        {
            Extracted::Bytes(data) => {
                let format = VideoFormat::sniff(&data);
                Ok((data, format))
            }
            Extracted::Remote(locator) => {
                logger.log_progress(&format!("fetching {}", locator));
                let data = self
                    .fetcher
                    .fetch(&locator)
                    .await
                    .map_err(|e| FallbackReason::Fetch(e.to_string()))?;
                let format = detect_format(&data, &locator);
                Ok((data, format))
            }
        }
    }

    fn fallback(&self, reason: FallbackReason, logger: &GenerationLogger) -> (PathBuf, Outcome) {
        logger.log_fallback(&reason);
        let sample = self.config.sample_asset.clone();
        if !sample.exists() {
            logger.log_error(&format!("sample asset missing at {}", sample.display()));
        }
        (sample, Outcome::FallenBack(reason))
    }

    /// Whether the configured sample asset is present.
    pub fn sample_available(&self) -> bool {
        self.config.sample_asset.exists()
    }
}

/// Magic bytes win; the URL's extension only decides for unknown bytes.
fn detect_format(data: &[u8], locator: &RemoteLocator) -> VideoFormat {
    VideoFormat::from_magic(data)
        .unwrap_or_else(|| VideoFormat::guess_from_url(locator.url().path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_prefers_magic_bytes() {
        let webm_url = RemoteLocator::parse("https://cdn.example.com/out.webm").unwrap();
        let gif_bytes = b"GIF89a....".to_vec();

        assert_eq!(detect_format(&gif_bytes, &webm_url), VideoFormat::Gif);
        assert_eq!(detect_format(b"\0\0\0\x18ftypmp42", &webm_url), VideoFormat::Mp4);
        assert_eq!(detect_format(b"opaque-bytes", &webm_url), VideoFormat::Webm);

        let plain = RemoteLocator::parse("https://cdn.example.com/out?id=1").unwrap();
        assert_eq!(detect_format(b"opaque-bytes", &plain), VideoFormat::Mp4);
    }
}
