//! API integration tests

use axum::body::Body;
use axum::Router;
use quorum::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::{scenario_coordinator, RecordingExecutor};

fn setup_app() -> (Router, Arc<RecordingExecutor>) {
    let executor = RecordingExecutor::new();
    let state = AppState::new(scenario_coordinator(executor.clone()));
    (quorum::api::router(state), executor)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (hyper::StatusCode, Value) {
    let builder = hyper::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn create(app: &Router, amount: f64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/proposals",
        Some(json!({ "destination": "recipient", "amount": amount })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_create_and_list_proposals() {
    let (app, _) = setup_app();

    let (status, body) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({ "destination": "recipient", "amount": 0.25, "memo": "rent" })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["payload"]["memo"], "rent");
    assert_eq!(body["endorsements"], json!([]));

    let (status, body) = send(&app, "GET", "/proposals", None).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_invalid_amount_is_bad_request() {
    let (app, _) = setup_app();

    let (status, body) = send(
        &app,
        "POST",
        "/proposals",
        Some(json!({ "destination": "recipient", "amount": -1.0 })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid amount"));

    let (_, body) = send(&app, "GET", "/proposals", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_proposal_includes_verdict() {
    let (app, _) = setup_app();
    let id = create(&app, 1.5).await;

    let (status, body) = send(&app, "GET", &format!("/proposals/{}", id), None).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["verdict"]["approved"], false);
    assert_eq!(body["verdict"]["requirement"]["threshold"], 2);
}

#[tokio::test]
async fn test_unknown_proposal_is_not_found() {
    let (app, _) = setup_app();
    let id = uuid::Uuid::new_v4();

    let (status, _) = send(&app, "GET", &format!("/proposals/{}", id), None).await;
    assert_eq!(status, hyper::StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/proposals/{}/endorsements", id),
        Some(json!({ "signer": "H1" })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Proposal not found"));
}

#[tokio::test]
async fn test_endorse_until_executed() {
    let (app, executor) = setup_app();
    let id = create(&app, 0.3).await;
    let uri = format!("/proposals/{}/endorsements", id);

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "signer": "A1" }))).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["verdict"]["ai_agents"], 1);

    let (_, body) = send(&app, "POST", &uri, Some(json!({ "signer": "A1" }))).await;
    assert_eq!(body["outcome"], "already_endorsed");

    let (_, body) = send(&app, "POST", &uri, Some(json!({ "signer": "H1" }))).await;
    assert_eq!(body["outcome"], "executed");
    assert_eq!(body["receipt"]["signature"], "sig-0");
    assert_eq!(executor.calls(), 1);

    let (status, _) = send(&app, "GET", &format!("/proposals/{}", id), None).await;
    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_signer_is_bad_request() {
    let (app, _) = setup_app();
    let id = create(&app, 0.3).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/proposals/{}/endorsements", id),
        Some(json!({ "signer": "  " })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_execution_and_retry() {
    let (app, executor) = setup_app();
    executor.set_failing(true);
    let id = create(&app, 0.3).await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("/proposals/{}/endorsements", id),
        Some(json!({ "signer": "H2" })),
    )
    .await;
    assert_eq!(body["outcome"], "execution_failed");

    let (_, body) = send(&app, "GET", &format!("/proposals/{}", id), None).await;
    assert_eq!(body["status"], "approved");

    executor.set_failing(false);
    let (status, body) = send(&app, "POST", &format!("/proposals/{}/execute", id), None).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["outcome"], "executed");
}

#[tokio::test]
async fn test_abandon_proposal() {
    let (app, _) = setup_app();
    let id = create(&app, 2.0).await;

    let (status, body) = send(&app, "DELETE", &format!("/proposals/{}", id), None).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["status"], "abandoned");

    let (status, _) = send(&app, "DELETE", &format!("/proposals/{}", id), None).await;
    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_governance_roundtrip() {
    let (app, _) = setup_app();

    let (status, body) = send(&app, "GET", "/governance", None).await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["owners"].as_array().unwrap().len(), 3);
    assert_eq!(body["default_threshold"], 2);
    assert_eq!(body["rules"][0]["condition"], "amount <= 0.5");

    let (status, body) = send(
        &app,
        "PUT",
        "/governance/owners",
        Some(json!({ "owners": [{ "identity": "solo", "role": "human" }] })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["owners"], json!([{ "identity": "solo", "role": "human" }]));

    let (status, body) = send(
        &app,
        "PUT",
        "/governance/policy",
        Some(json!({
            "default_threshold": 1,
            "rules": [{
                "condition": { "kind": "amount_above", "value": 10.0 },
                "threshold": 1,
                "ai_agents_required": 1
            }]
        })),
    )
    .await;
    assert_eq!(status, hyper::StatusCode::OK);
    assert_eq!(body["default_threshold"], 1);
    assert_eq!(body["rules"].as_array().unwrap().len(), 1);

    let id = create(&app, 0.3).await;
    let (_, body) = send(
        &app,
        "POST",
        &format!("/proposals/{}/endorsements", id),
        Some(json!({ "signer": "solo" })),
    )
    .await;
    assert_eq!(body["outcome"], "executed");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = setup_app();

    let (status, _) = send(&app, "POST", "/proposals", Some(json!({ "amount": "lots" }))).await;
    assert!(status.is_client_error());
}
