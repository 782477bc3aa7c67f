// Integration tests for the controller HTTP surface

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use trafficgrid::api::{create_router, AppState};
use trafficgrid::{Broadcaster, ControllerState};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn create_test_app() -> (Arc<ControllerState>, Router) {
    let state = Arc::new(ControllerState::default());
    let broadcaster = Broadcaster::new(Arc::clone(&state), Duration::from_millis(10));
    let app = create_router(AppState {
        state: Arc::clone(&state),
        broadcaster,
    });
    (state, app)
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn north_report(instance_id: &str) -> String {
    json!({
        "zone": "North",
        "count": 2,
        "instance_id": instance_id,
        "entities": [
            {"id": "North-car-1", "x": 10.0, "y": 97.5, "direction": "E"},
            {"id": "North-car-2", "x": 102.5, "y": 40.0, "direction": "S"}
        ],
        "signal": {"x": 100.0, "y": 100.0, "state": "stop"}
    })
    .to_string()
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Valid registration → 200 with a confirmation message
#[tokio::test]
async fn test_register_worker_returns_200() {
    let (state, app) = create_test_app();

    let body = json!({
        "zone": "North",
        "address": "http://localhost:5101",
        "instance_id": "worker-1"
    });
    let response = app
        .oneshot(post_json("/api/workers/register", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("North"));

    let record = state.worker("North").unwrap();
    assert_eq!(record.address, "http://localhost:5101");
    assert_eq!(record.count, 0);
}

/// Missing zone → 400, registry untouched
#[tokio::test]
async fn test_register_missing_zone_returns_400() {
    let (state, app) = create_test_app();

    let body = json!({"address": "http://localhost:5101", "instance_id": "worker-1"});
    let response = app
        .oneshot(post_json("/api/workers/register", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("zone"));
    assert_eq!(state.worker_count(), 0);
}

/// Body that is not JSON → 400
#[tokio::test]
async fn test_register_malformed_body_returns_400() {
    let (_state, app) = create_test_app();

    let response = app
        .oneshot(post_json("/api/workers/register", "{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Report for a zone nobody registered → 404
#[tokio::test]
async fn test_report_unknown_zone_returns_404() {
    let (_state, app) = create_test_app();

    let response = app
        .oneshot(post_json("/api/report", north_report("worker-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Report from a superseded worker instance → 404, stored data unchanged
#[tokio::test]
async fn test_report_identity_mismatch_returns_404() {
    let (state, app) = create_test_app();
    state.register("North", "http://localhost:5101", "worker-2");

    let response = app
        .oneshot(post_json("/api/report", north_report("worker-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.worker("North").unwrap().count, 0);
}

/// Report without instance_id → 400
#[tokio::test]
async fn test_report_missing_instance_returns_400() {
    let (state, app) = create_test_app();
    state.register("North", "http://localhost:5101", "worker-1");

    let body = json!({"zone": "North", "count": 0, "entities": []});
    let response = app
        .oneshot(post_json("/api/report", body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Accepted report shows up in /api/status
#[tokio::test]
async fn test_report_then_status() {
    let (state, app) = create_test_app();
    state.register("North", "http://localhost:5101", "worker-1");

    let response = app
        .clone()
        .oneshot(post_json("/api/report", north_report("worker-1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "inactive");
    assert_eq!(json["step"], 0);
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["worker_count"], 1);
    assert_eq!(json["zones"]["North"]["entities"][1]["direction"], "S");
    assert_eq!(json["zones"]["North"]["signal"]["state"], "stop");
    assert_eq!(json["workers"]["North"]["instance_id"], "worker-1");
    assert_eq!(json["workers"]["North"]["count"], 2);
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// First SSE frame carries the full state tagged initial_data
#[tokio::test]
async fn test_stream_first_event_is_initial_data() {
    let (state, app) = create_test_app();
    state.register("North", "http://localhost:5101", "worker-1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no SSE frame within 2s")
        .unwrap()
        .unwrap();

    let text = String::from_utf8(frame.to_vec()).unwrap();
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .expect("frame has a data line");
    let event: Value = serde_json::from_str(data.trim_start()).unwrap();

    assert_eq!(event["type"], "initial_data");
    assert_eq!(event["worker_count"], 1);
    assert!(event["history"].as_array().unwrap().is_empty());
}
