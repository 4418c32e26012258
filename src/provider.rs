use std::future::Future;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("{provider} API error ({status}): {body}")]
    Status { provider: &'static str, status: StatusCode, body: String },
    #[error("No image URL returned in {0} API response")]
    MissingImage(&'static str),
    #[error("Invalid {provider} API response: {reason}")]
    Decode { provider: &'static str, reason: String },
    #[error("Failed to poll prediction status ({0})")]
    Poll(StatusCode),
    #[error("Prediction failed with status: {status}{}", .error.as_deref().map(|e| format!(": {e}")).unwrap_or_default())]
    Prediction { status: String, error: Option<String> },
    #[error("Image generation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Http(e.to_string())
    }
}

/// A hosted image-generation backend that turns a prompt into an image URL.
///
/// Implementations hold their own credentials and must abort promptly when
/// `cancel` fires, including any in-flight HTTP call.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_image(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, UpstreamError>;
}

/// Races `fut` against the token.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(UpstreamError::Cancelled),
        out = fut => out,
    }
}

/// Reads the body of a non-2xx response into a `Status` error.
pub(crate) async fn status_error(provider: &'static str, response: reqwest::Response) -> UpstreamError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = if body.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    };
    UpstreamError::Status { provider, status, body }
}

pub(crate) fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...[{} chars total]", &s[..idx], s.chars().count()),
        None => s.to_string(),
    }
}
