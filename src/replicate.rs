use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, error, warn};

use crate::provider::{cancellable, preview, status_error, ImageProvider, UpstreamError};

const PROVIDER: &str = "Replicate";

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_key: String,
    pub base_url: String,
    pub version: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

/// Job-based image API: submit a prediction, then poll it until it settles.
pub struct ReplicateClient {
    client: Client,
    config: ReplicateConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Unknown,
}

impl PredictionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "starting" => PredictionStatus::Starting,
            "processing" => PredictionStatus::Processing,
            "succeeded" => PredictionStatus::Succeeded,
            "failed" => PredictionStatus::Failed,
            "canceled" => PredictionStatus::Canceled,
            _ => PredictionStatus::Unknown,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub id: String,
    /// Raw upstream status; reported verbatim when the job does not succeed.
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    pub fn state(&self) -> PredictionStatus {
        PredictionStatus::parse(&self.status)
    }

    /// Models emit either a list of URLs or a single URL.
    fn first_output(&self) -> Option<String> {
        let first = match self.output.as_ref()? {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        };
        first.filter(|s| !s.is_empty()).map(str::to_string)
    }

    fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl ReplicateClient {
    pub fn new(client: Client, config: ReplicateConfig) -> Self {
        Self { client, config }
    }

    fn predictions_endpoint(&self) -> String {
        format!("{}/predictions", self.config.base_url.trim_end_matches('/'))
    }

    fn auth(&self) -> String {
        format!("Token {}", self.config.api_key)
    }

    async fn submit(&self, prompt: &str) -> Result<Prediction, UpstreamError> {
        let url = self.predictions_endpoint();
        info!("🔗 Submitting prediction to {}", url);

        let response = self.client
            .post(&url)
            .header(AUTHORIZATION, self.auth())
            .json(&json!({
                "version": self.config.version,
                "input": {
                    "prompt": prompt,
                    "num_outputs": 1,
                    "guidance_scale": 7.5,
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(PROVIDER, response).await;
            error!("❌ {}", err);
            return Err(err);
        }
        decode(response).await
    }

    async fn fetch(&self, id: &str) -> Result<Prediction, UpstreamError> {
        let response = self.client
            .get(format!("{}/{}", self.predictions_endpoint(), id))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("❌ Poll for prediction {} returned {}", id, status);
            return Err(UpstreamError::Poll(status));
        }
        decode(response).await
    }

    /// Polls until the prediction leaves `starting`/`processing` or the attempt
    /// budget is spent, sleeping `poll_interval` before each fetch.
    async fn wait(&self, mut prediction: Prediction, cancel: &CancellationToken) -> Result<Prediction, UpstreamError> {
        let mut attempts = 0u32;
        while prediction.state().is_pending() && attempts < self.config.max_poll_attempts {
            cancellable(cancel, async {
                tokio::time::sleep(self.config.poll_interval).await;
                Ok(())
            })
            .await?;
            prediction = cancellable(cancel, self.fetch(&prediction.id)).await?;
            attempts += 1;
            debug!(id = %prediction.id, attempt = attempts, status = %prediction.status, "polled prediction");
        }
        if prediction.state().is_pending() {
            warn!("⏱️ Prediction {} still {} after {} polls", prediction.id, prediction.status, attempts);
        }
        Ok(prediction)
    }
}

#[async_trait]
impl ImageProvider for ReplicateClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate_image(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, UpstreamError> {
        let submitted = cancellable(cancel, self.submit(prompt)).await?;
        info!("📤 Prediction {} created with status {}", submitted.id, submitted.status);

        let prediction = self.wait(submitted, cancel).await?;
        match (prediction.state(), prediction.first_output()) {
            (PredictionStatus::Succeeded, Some(url)) => {
                info!("✅ Prediction {} succeeded: {}", prediction.id, preview(&url, 80));
                Ok(url)
            }
            _ => {
                let err = UpstreamError::Prediction {
                    status: prediction.status.clone(),
                    error: prediction.error_message(),
                };
                error!("❌ Prediction {}: {}", prediction.id, err);
                Err(err)
            }
        }
    }
}

async fn decode(response: reqwest::Response) -> Result<Prediction, UpstreamError> {
    response.json().await.map_err(|e| UpstreamError::Decode {
        provider: PROVIDER,
        reason: e.to_string(),
    })
}
