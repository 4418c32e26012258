use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};

use crate::provider::{cancellable, preview, status_error, ImageProvider, UpstreamError};

const PROVIDER: &str = "Grok";

#[derive(Debug, Clone)]
pub struct GrokConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Synchronous image API: one POST, image URL in the response body.
pub struct GrokClient {
    client: Client,
    config: GrokConfig,
}

impl GrokClient {
    pub fn new(client: Client, config: GrokConfig) -> Self {
        Self { client, config }
    }

    async fn perform_api_call(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/images/generations", self.config.base_url.trim_end_matches('/'));
        info!("🔗 Calling {} image API: {}", PROVIDER, url);

        let response = self.client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&json!({
                "model": self.config.model,
                "prompt": prompt,
                "n": 1,
            }))
            .send()
            .await?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        if !status.is_success() {
            let err = status_error(PROVIDER, response).await;
            error!("❌ {}", err);
            return Err(err);
        }

        let parsed: ImagesResponse = response.json().await.map_err(|e| UpstreamError::Decode {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|u| !u.is_empty())
            .ok_or(UpstreamError::MissingImage(PROVIDER))
    }
}

#[async_trait]
impl ImageProvider for GrokClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate_image(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, UpstreamError> {
        info!("Generating image with {} API...", PROVIDER);
        let url = cancellable(cancel, self.perform_api_call(prompt)).await?;
        info!("✅ Image generation succeeded: {}", preview(&url, 80));
        Ok(url)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}
