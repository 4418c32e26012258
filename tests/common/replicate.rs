//! In-process stand-in for the Replicate predictions API.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::spawn_upstream;

#[derive(Clone, Copy)]
pub enum Finish {
    /// Report `processing` for this many polls, then succeed.
    After(usize),
    /// Report `processing` for this many polls, then fail.
    FailAfter(usize),
    /// Report `processing` for this many polls, then a status the client has no name for.
    AbortAfter(usize),
    Never,
}

pub struct MockReplicate {
    finish: Finish,
    submit_status: StatusCode,
    poll_status: StatusCode,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub last_input: Mutex<Option<Value>>,
}

impl MockReplicate {
    pub fn new(finish: Finish) -> Arc<Self> {
        Self::with_statuses(finish, StatusCode::CREATED, StatusCode::OK)
    }

    pub fn with_statuses(finish: Finish, submit_status: StatusCode, poll_status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            finish,
            submit_status,
            poll_status,
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        })
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Token test-key")
}

async fn submit(State(mock): State<Arc<MockReplicate>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.submits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
    }
    if !mock.submit_status.is_success() {
        return (mock.submit_status, "quota exceeded").into_response();
    }
    *mock.last_input.lock() = Some(body);
    (StatusCode::CREATED, Json(json!({"id": "pred-1", "status": "starting", "output": null}))).into_response()
}

async fn poll(State(mock): State<Arc<MockReplicate>>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let n = mock.polls.fetch_add(1, Ordering::SeqCst) + 1;
    if !authorized(&headers) || id != "pred-1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    if !mock.poll_status.is_success() {
        return mock.poll_status.into_response();
    }
    let body = match mock.finish {
        Finish::After(k) if n > k => json!({"id": id, "status": "succeeded", "output": ["https://x/img.png"]}),
        Finish::FailAfter(k) if n > k => json!({"id": id, "status": "failed", "error": "CUDA out of memory"}),
        Finish::AbortAfter(k) if n > k => json!({"id": id, "status": "aborted", "error": "killed"}),
        _ => json!({"id": id, "status": "processing", "output": null}),
    };
    Json(body).into_response()
}

/// Serves the mock on a local port and returns its base URL.
pub async fn serve(mock: Arc<MockReplicate>) -> String {
    let app = Router::new()
        .route("/predictions", post(submit))
        .route("/predictions/:id", get(poll))
        .with_state(mock);
    spawn_upstream(app).await
}
