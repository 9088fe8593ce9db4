//! Application state.

use std::sync::Arc;

use clipforge_pipeline::{Generator, PipelineConfig};
use clipforge_provider::{HttpFetcher, ProviderClient, ProviderConfig, ReplicateClient};
use clipforge_storage::{ArtifactCache, FileArtifactCache};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::sessions::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub generator: Arc<Generator>,
    pub provider: Option<Arc<dyn ProviderClient>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Loads the cache index and prepares the data directories. A missing
    /// provider token is not an error: requests are then served the sample.
    pub async fn new(
        config: ApiConfig,
        pipeline: PipelineConfig,
        provider_config: ProviderConfig,
    ) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(pipeline.sessions_dir()).await?;

        let cache = FileArtifactCache::open(pipeline.cache_index_path()).await?;
        let fetcher = HttpFetcher::new(&provider_config)?;

        let provider: Option<Arc<dyn ProviderClient>> = if provider_config.is_configured() {
            let client = ReplicateClient::new(&provider_config)?;
            info!(model = %client.model(), "Generation provider configured");
            Some(Arc::new(client))
        } else {
            warn!("REPLICATE_API_TOKEN not set; every request will be served the sample asset");
            None
        };

        if !pipeline.sample_asset.exists() {
            warn!(
                path = %pipeline.sample_asset.display(),
                "Sample asset not found; fallback responses will fail"
            );
        }

        let sessions = SessionStore::new(pipeline.sessions_dir());
        let generator = Generator::new(pipeline, Arc::new(cache), Arc::new(fetcher));
        generator.store().ensure_dir().await?;

        Ok(Self::from_parts(config, generator, provider, sessions))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: ApiConfig,
        generator: Generator,
        provider: Option<Arc<dyn ProviderClient>>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            config,
            generator: Arc::new(generator),
            provider,
            sessions: Arc::new(sessions),
        }
    }

    pub fn cache(&self) -> &Arc<dyn ArtifactCache> {
        self.generator.cache()
    }
}
