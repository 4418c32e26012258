use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    error::MockupError,
    models::{MockupConfiguration, Mockups},
    prompt::{prompt_for, with_view, View},
    provider::{preview, ImageProvider},
};

/// Renders the front view and then the back view of one configuration.
///
/// All or nothing: the back view is only requested once the front view
/// exists, and a failed back view discards the front URL.
pub async fn generate_mockups(
    provider: &dyn ImageProvider,
    config: &MockupConfiguration,
    cancel: &CancellationToken,
) -> Result<Mockups, MockupError> {
    if config.design_prompt.trim().is_empty() {
        return Err(MockupError::Validation("Design prompt is required".into()));
    }

    let prompt = prompt_for(config);
    info!(provider = provider.name(), "🎯 Building mockups with prompt: {}", preview(&prompt, 100));

    let front = provider.generate_image(&with_view(&prompt, View::Front), cancel).await?;
    let back = provider.generate_image(&with_view(&prompt, View::Back), cancel).await?;
    Ok(Mockups { front, back })
}

/// [`generate_mockups`] bounded by a wall-clock deadline. On expiry the
/// token is cancelled so no poll loop outlives the request.
pub async fn generate_within(
    provider: &dyn ImageProvider,
    config: &MockupConfiguration,
    cancel: CancellationToken,
    deadline: Duration,
) -> Result<Mockups, MockupError> {
    let _guard = cancel.clone().drop_guard();
    match tokio::time::timeout(deadline, generate_mockups(provider, config, &cancel)).await {
        Ok(result) => result,
        Err(_) => Err(MockupError::DeadlineExceeded(deadline.as_secs())),
    }
}
