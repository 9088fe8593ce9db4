//! Replicate predictions API client.
//!
//! A prediction is created with `Prefer: wait`, which lets short jobs finish
//! inside the create call. Longer jobs come back in a non-terminal state and
//! are polled until they succeed, fail or get canceled. The caller bounds the
//! whole exchange with its own timeout.

use std::time::Duration;

use async_trait::async_trait;
use clipforge_models::{GenerationOptions, ProviderResponse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::ProviderClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};

/// Client for hosted models on the Replicate predictions API.
pub struct ReplicateClient {
    client: Client,
    api_token: String,
    model: String,
    base_url: String,
    poll_interval: Duration,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    fn into_output(self) -> ProviderResult<ProviderResponse> {
        match self.status.as_str() {
            "succeeded" => Ok(ProviderResponse::from(self.output)),
            _ => {
                let error = match self.error {
                    Value::Null => "no error reported".to_string(),
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Err(ProviderError::PredictionFailed {
                    id: self.id,
                    status: self.status,
                    error,
                })
            }
        }
    }
}

impl ReplicateClient {
    /// Build a client from config. Fails when no API token is configured.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_token = config
            .api_token
            .clone()
            .ok_or_else(|| ProviderError::not_configured("REPLICATE_API_TOKEN not set"))?;

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            api_token,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: config.poll_interval,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy for status polls.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint and pinned version for the configured model.
    ///
    /// `owner/name:version` pins a version through the generic endpoint;
    /// `owner/name` runs the model's latest version.
    fn create_target(&self) -> (String, Option<&str>) {
        match self.model.split_once(':') {
            Some((_, version)) => (format!("{}/v1/predictions", self.base_url), Some(version)),
            None => (
                format!("{}/v1/models/{}/predictions", self.base_url, self.model),
                None,
            ),
        }
    }

    async fn create(&self, input: Map<String, Value>) -> ProviderResult<Prediction> {
        let (url, version) = self.create_target();
        let body = CreatePrediction { version, input };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;

        read_prediction(response).await
    }

    async fn get(&self, url: &str) -> ProviderResult<Prediction> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        read_prediction(response).await
    }

    fn status_url(&self, prediction: &Prediction) -> String {
        prediction
            .urls
            .as_ref()
            .and_then(|u| u.get.clone())
            .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id))
    }
}

async fn read_prediction(response: reqwest::Response) -> ProviderResult<Prediction> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_http_status(status.as_u16(), &body));
    }

    response
        .json::<Prediction>()
        .await
        .map_err(|e| ProviderError::invalid_response(format!("Failed to parse prediction: {}", e)))
}

#[async_trait]
impl ProviderClient for ReplicateClient {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn invoke(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ProviderResult<ProviderResponse> {
        let input = options.to_provider_input(prompt);
        info!(model = %self.model, "Creating prediction");

        let mut prediction = self.create(input).await?;
        debug!(
            prediction_id = %prediction.id,
            status = %prediction.status,
            "Prediction created"
        );

        let mut polls = 0u32;
        while !prediction.is_terminal() {
            if prediction.id.is_empty() && prediction.urls.is_none() {
                return Err(ProviderError::invalid_response(
                    "Prediction is not finished and has no status URL",
                ));
            }
            tokio::time::sleep(self.poll_interval).await;

            let url = self.status_url(&prediction);
            prediction = with_retry(&self.retry, "poll_prediction", || self.get(&url)).await?;
            polls += 1;

            debug!(
                prediction_id = %prediction.id,
                status = %prediction.status,
                polls = polls,
                "Polled prediction"
            );
        }

        if prediction.status != "succeeded" {
            warn!(
                prediction_id = %prediction.id,
                status = %prediction.status,
                "Prediction did not succeed"
            );
        } else {
            info!(prediction_id = %prediction.id, polls = polls, "Prediction succeeded");
        }

        prediction.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: &str) -> ReplicateClient {
        let config = ProviderConfig {
            api_token: Some("token".to_string()),
            model: model.to_string(),
            base_url: "https://api.example.com/".to_string(),
            ..ProviderConfig::default()
        };
        ReplicateClient::new(&config).unwrap()
    }

    #[test]
    fn test_requires_token() {
        let err = ReplicateClient::new(&ProviderConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn test_create_target_for_model_slug() {
        let c = client("minimax/video-01");
        let (url, version) = c.create_target();
        assert_eq!(url, "https://api.example.com/v1/models/minimax/video-01/predictions");
        assert_eq!(version, None);
    }

    #[test]
    fn test_create_target_for_pinned_version() {
        let c = client("acme/vid:abc123");
        let (url, version) = c.create_target();
        assert_eq!(url, "https://api.example.com/v1/predictions");
        assert_eq!(version, Some("abc123"));
    }

    #[test]
    fn test_failed_prediction_into_error() {
        let prediction: Prediction = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "status": "failed",
            "error": "NSFW content detected"
        }))
        .unwrap();
        let err = prediction.into_output().unwrap_err();
        assert!(err.to_string().contains("NSFW content detected"));
    }
}
