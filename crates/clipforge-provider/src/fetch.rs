//! Remote artifact download.

use async_trait::async_trait;
use clipforge_models::RemoteLocator;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info};

use crate::client::ArtifactFetcher;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};

/// Downloads artifacts over HTTP with a size cap.
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder().timeout(config.fetch_timeout).build()?;
        Ok(Self {
            client,
            max_bytes: config.max_artifact_bytes,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, locator: &RemoteLocator) -> ProviderResult<Vec<u8>> {
        let response = self.client.get(locator.url().clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status(status.as_u16(), &body));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(ProviderError::PayloadTooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if data.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(ProviderError::PayloadTooLarge {
                    limit: self.max_bytes,
                });
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(ProviderError::EmptyPayload);
        }
        Ok(data)
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, locator: &RemoteLocator) -> ProviderResult<Vec<u8>> {
        debug!(url = %locator, "Fetching remote artifact");
        let data = with_retry(&self.retry, "fetch_artifact", || self.fetch_once(locator)).await?;
        info!(url = %locator, size_bytes = data.len(), "Fetched remote artifact");
        Ok(data)
    }
}
