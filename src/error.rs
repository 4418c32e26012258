use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::{models::MockupResult, provider::UpstreamError};

/// Failure of `POST /api/generate-mockup`. Always rendered as a `MockupResult`.
#[derive(Debug, Error)]
pub enum MockupError {
    #[error("{0}")]
    Validation(String),
    #[error("Image generation API not configured. Please set {0} environment variable.")]
    Configuration(&'static str),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Mockup generation timed out after {0}s")]
    DeadlineExceeded(u64),
}

impl MockupError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockupError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MockupError {
    fn into_response(self) -> Response {
        match &self {
            MockupError::Validation(msg) => tracing::warn!(error = %msg, "Rejected mockup request"),
            MockupError::Configuration(var) => tracing::error!(var = *var, "Image generation API key missing"),
            other => tracing::error!(error = %other, "Mockup generation error"),
        }
        (self.status(), Json(MockupResult::failed(self.to_string()))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order service error: {0}")]
    Upstream(String),
    #[error("Invalid order data: {0}")]
    Decode(String),
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Order lookup failed");
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
