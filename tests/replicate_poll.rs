//! Poll-loop behaviour of the Replicate provider against an in-process mock API.

mod common;

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use common::replicate::{serve, Finish, MockReplicate};
use locomotive::{
    provider::{ImageProvider, UpstreamError},
    replicate::{ReplicateClient, ReplicateConfig},
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

async fn client_for(mock: Arc<MockReplicate>, poll_interval: Duration) -> ReplicateClient {
    let base_url = serve(mock).await;
    ReplicateClient::new(
        reqwest::Client::new(),
        ReplicateConfig {
            api_key: "test-key".into(),
            base_url,
            version: "v-test".into(),
            poll_interval,
            max_poll_attempts: 120,
        },
    )
}

#[tokio::test]
async fn succeeds_after_n_processing_polls() {
    let mock = MockReplicate::new(Finish::After(3));
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let url = client.generate_image("a prompt", &CancellationToken::new()).await.unwrap();

    assert_eq!(url, "https://x/img.png");
    assert_eq!(mock.submits(), 1);
    assert_eq!(mock.polls(), 4);
}

#[tokio::test]
async fn submission_carries_version_and_input() {
    let mock = MockReplicate::new(Finish::After(0));
    let client = client_for(mock.clone(), Duration::ZERO).await;

    client.generate_image("neon tiger", &CancellationToken::new()).await.unwrap();

    let body = mock.last_input.lock().clone().unwrap();
    assert_eq!(
        body,
        json!({"version": "v-test", "input": {"prompt": "neon tiger", "num_outputs": 1, "guidance_scale": 7.5}})
    );
}

#[tokio::test]
async fn gives_up_after_attempt_budget() {
    let mock = MockReplicate::new(Finish::Never);
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let err = client.generate_image("p", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(mock.polls(), 120);
    assert_eq!(err.to_string(), "Prediction failed with status: processing");
}

#[tokio::test]
async fn terminal_failure_carries_upstream_message() {
    let mock = MockReplicate::new(Finish::FailAfter(1));
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let err = client.generate_image("p", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.to_string(), "Prediction failed with status: failed: CUDA out of memory");
    assert_eq!(mock.polls(), 2);
}

#[tokio::test]
async fn unrecognised_terminal_status_is_reported_verbatim() {
    let mock = MockReplicate::new(Finish::AbortAfter(1));
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let err = client.generate_image("p", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(&err, UpstreamError::Prediction { status, .. } if status == "aborted"));
    assert_eq!(err.to_string(), "Prediction failed with status: aborted: killed");
    assert_eq!(mock.polls(), 2);
}

#[tokio::test]
async fn submission_error_includes_status_and_body() {
    let mock = MockReplicate::with_statuses(Finish::Never, StatusCode::PAYMENT_REQUIRED, StatusCode::OK);
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let err = client.generate_image("p", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Status { status, .. } if status == StatusCode::PAYMENT_REQUIRED));
    assert_eq!(err.to_string(), "Replicate API error (402 Payment Required): quota exceeded");
    assert_eq!(mock.polls(), 0);
}

#[tokio::test]
async fn poll_error_stops_the_loop() {
    let mock = MockReplicate::with_statuses(Finish::Never, StatusCode::CREATED, StatusCode::BAD_GATEWAY);
    let client = client_for(mock.clone(), Duration::ZERO).await;

    let err = client.generate_image("p", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to poll prediction status (502 Bad Gateway)");
    assert_eq!(mock.polls(), 1);
}

#[tokio::test]
async fn cancellation_aborts_polling() {
    let mock = MockReplicate::new(Finish::Never);
    let client = client_for(mock.clone(), Duration::from_millis(50)).await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        trigger.cancel();
    });

    let err = client.generate_image("p", &cancel).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Cancelled));
    assert!(mock.polls() < 120);
}
