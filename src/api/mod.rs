// Controller HTTP API: worker registration/reports and observer streams

mod stream;
mod workers;

use crate::broadcast::Broadcaster;
use crate::state::ControllerState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use workers::AppError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<ControllerState>,
    pub broadcaster: Broadcaster,
}

/// Create the controller router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/workers/register", post(workers::register_worker))
        .route("/api/report", post(workers::report_update))
        .route("/api/status", get(stream::status))
        .route("/api/stream", get(stream::stream_events))
        .route("/api/ws", get(stream::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
