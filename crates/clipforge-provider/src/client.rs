//! Provider seams.

use async_trait::async_trait;
use clipforge_models::{GenerationOptions, ProviderResponse, RemoteLocator};

use crate::error::ProviderResult;

/// External generation service.
///
/// Credentials and model selection are resolved before the client is
/// constructed; `invoke` may block for minutes and may fail.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &str;

    /// Run one generation and return the provider's raw output.
    async fn invoke(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ProviderResult<ProviderResponse>;
}

/// Resolves a remote locator to artifact bytes.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, locator: &RemoteLocator) -> ProviderResult<Vec<u8>>;
}
