//! Worker HTTP API: `POST /api/step` runs one tick and acknowledges it.

use crate::agent::WorkerAgent;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use std::sync::Arc;
use tracing::warn;
use trafficgrid::protocol::{ErrorResponse, StepAck, StepCommand};

/// Shared state for the worker API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<WorkerAgent>,
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/step", post(step))
        .with_state(state)
}

async fn step(State(state): State<ApiState>, body: Bytes) -> Response {
    let command: StepCommand = match serde_json::from_slice(&body) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Malformed step command");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid step command: {}", e),
                }),
            )
                .into_response();
        }
    };

    state.agent.handle_step(command.step_number).await;

    Json(StepAck::acknowledged(state.agent.instance_id())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_app() -> (Arc<WorkerAgent>, Router) {
        let config = WorkerConfig {
            zone: "West".to_string(),
            // Nothing listens here; reports fail fast
            controller_url: "http://127.0.0.1:1".to_string(),
            report_timeout_ms: 500,
            ..WorkerConfig::default()
        };
        let agent = Arc::new(WorkerAgent::new(&config, "http://localhost:5102".to_string()));
        let router = create_router(ApiState {
            agent: Arc::clone(&agent),
        });
        (agent, router)
    }

    fn step_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/step")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_step_returns_ack() {
        let (agent, app) = create_test_app();

        let response = app
            .oneshot(step_request(
                r#"{"step_number": 4, "controller_id": "controller-test"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let ack: StepAck = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ack.status, "acknowledged");
        assert_eq!(ack.instance_id, agent.instance_id());
        assert_eq!(agent.steps(), 1);
    }

    #[tokio::test]
    async fn test_malformed_step_returns_400() {
        let (agent, app) = create_test_app();

        let response = app
            .oneshot(step_request(r#"{"step": "four"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(agent.steps(), 0);
    }
}
