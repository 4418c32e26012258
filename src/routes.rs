use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::{path::Path, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::{
    config::{Config, ProviderKind},
    error::{MockupError, OrderError},
    grok::GrokClient,
    mockup::generate_within,
    models::{MockupConfiguration, MockupResult, OrderListResponse, OrderSummary},
    orders::OrderSource,
    provider::{preview, ImageProvider},
    replicate::ReplicateClient,
};

#[derive(Clone)]
pub struct AppState {
    /// `None` when the selected provider has no API key.
    pub images: Option<Arc<dyn ImageProvider>>,
    /// Variable to name when `images` is missing.
    pub key_var: &'static str,
    pub orders: Arc<dyn OrderSource>,
    pub mockup_deadline: Duration,
    /// Cancelled on shutdown; every mockup request runs on a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn from_config(
        config: &Config,
        http: reqwest::Client,
        orders: Arc<dyn OrderSource>,
        shutdown: CancellationToken,
    ) -> Self {
        let images: Option<Arc<dyn ImageProvider>> = config.api_key().map(|key| -> Arc<dyn ImageProvider> {
            match config.provider {
                ProviderKind::Grok => Arc::new(GrokClient::new(http.clone(), config.grok(key.to_string()))),
                ProviderKind::Replicate => Arc::new(ReplicateClient::new(http.clone(), config.replicate(key.to_string()))),
            }
        });

        match &images {
            Some(p) => info!("🖼️ Image provider: {}", p.name()),
            None => warn!("{} is not set; mockup generation will fail until it is configured", config.provider.key_var()),
        }

        Self {
            images,
            key_var: config.provider.key_var(),
            orders,
            mockup_deadline: config.mockup_deadline,
            shutdown,
        }
    }
}

pub fn router(state: AppState, spa_dir: &Path) -> Router {
    let spa = ServeDir::new(spa_dir).fallback(ServeFile::new(spa_dir.join("index.html")));

    let api = Router::new()
        .route("/generate-mockup", post(generate_mockup))
        .route("/orders", get(list_orders))
        .route("/orders/summary", get(order_summary))
        .fallback(api_not_found);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(move |req: Request| spa_fallback(spa.clone(), req))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

/// Serves the client bundle for any path the server does not own.
async fn spa_fallback(spa: ServeDir<ServeFile>, req: Request) -> Response {
    let path = req.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return api_not_found().await.into_response();
    }
    if path.starts_with("/health") {
        return StatusCode::NOT_FOUND.into_response();
    }
    match spa.oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

pub async fn generate_mockup(
    State(state): State<AppState>,
    payload: Result<Json<MockupConfiguration>, JsonRejection>,
) -> Result<Json<MockupResult>, MockupError> {
    let provider = state.images.clone().ok_or(MockupError::Configuration(state.key_var))?;
    let Json(body) = payload.map_err(|e| MockupError::Validation(e.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate_mockup", %request_id);
    async move {
        info!(
            clothing_type = %body.clothing_type,
            base_color = %body.base_color,
            fit = %body.fit,
            branding_style = %body.branding_style,
            placement = %body.placement,
            "🚀 Generate mockup request received: {}",
            preview(&body.design_prompt, 50)
        );

        let mockups = generate_within(provider.as_ref(), &body, state.shutdown.child_token(), state.mockup_deadline).await?;
        info!("✅ Mockups ready");
        Ok::<_, MockupError>(Json(MockupResult::succeeded(mockups.front, mockups.back)))
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet: String,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<OrderListResponse>, OrderError> {
    let wallet = query.wallet.trim();
    if wallet.is_empty() {
        return Ok(Json(OrderListResponse::default()));
    }
    let orders = state.orders.orders_for_wallet(wallet).await?;
    Ok(Json(OrderListResponse { orders }))
}

pub async fn order_summary(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<OrderSummary>, OrderError> {
    let wallet = query.wallet.trim();
    if wallet.is_empty() {
        return Ok(Json(OrderSummary::default()));
    }
    let orders = state.orders.orders_for_wallet(wallet).await?;
    Ok(Json(OrderSummary::from_orders(&orders)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "API endpoint not found" })))
}
