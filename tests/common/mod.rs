#![allow(dead_code)]

pub mod replicate;

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use locomotive::{
    orders::{InMemoryOrders, OrderSource},
    provider::{ImageProvider, UpstreamError},
    routes::{router, AppState},
};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const SPA_INDEX: &str = "<!doctype html><div id=\"root\"></div>";

/// Provider that replays scripted outcomes in order and records every prompt.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, UpstreamError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<String, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self { outcomes: Mutex::new(outcomes.into()), ..Default::default() })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate_image(&self, prompt: &str, _cancel: &CancellationToken) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Http("script exhausted".into())))
    }
}

pub struct TestApp {
    pub router: Router,
    _spa: TempDir,
}

pub fn spa_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), SPA_INDEX).unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('locomotive')").unwrap();
    dir
}

pub fn state(images: Option<Arc<dyn ImageProvider>>, orders: Arc<dyn OrderSource>) -> AppState {
    AppState {
        images,
        key_var: "GROK_API_KEY",
        orders,
        mockup_deadline: Duration::from_secs(30),
        shutdown: CancellationToken::new(),
    }
}

pub fn build_app(state: AppState) -> TestApp {
    let spa = spa_dir();
    TestApp { router: router(state, spa.path()), _spa: spa }
}

pub fn app_with_provider(provider: Arc<ScriptedProvider>) -> TestApp {
    build_app(state(Some(provider as Arc<dyn ImageProvider>), Arc::new(InMemoryOrders::new())))
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
