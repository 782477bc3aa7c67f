use crate::api::AppState;
use crate::protocol::{
    ErrorResponse, MessageResponse, RegisterRequest, ReportRequest, ValidationError,
};
use crate::registry::RejectReason;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// POST /api/workers/register - Register or re-register a zone's worker
pub(crate) async fn register_worker(
    State(app): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let req: RegisterRequest = parse_body(&body)?;
    req.validate()?;

    app.state.register(&req.zone, &req.address, &req.instance_id);

    info!(
        zone = %req.zone,
        instance_id = %req.instance_id,
        workers = app.state.worker_count(),
        "Worker registration accepted"
    );

    Ok(Json(MessageResponse {
        message: format!(
            "Worker {} registered successfully for zone {}",
            req.instance_id, req.zone
        ),
    }))
}

/// POST /api/report - Accept one step's result from a worker
pub(crate) async fn report_update(
    State(app): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let req: ReportRequest = parse_body(&body)?;
    let count = req.validate()?;

    let zone = req.zone.clone();
    let instance_id = req.instance_id.clone();

    app.state
        .accept_report(&zone, &instance_id, req.into_snapshot(), count)
        .map_err(|reason| {
            warn!(
                zone = %zone,
                instance_id = %instance_id,
                reason = %reason,
                "Rejected report from unknown or mismatched worker"
            );
            AppError::Rejected(reason)
        })?;

    debug!(zone = %zone, count = count, "Report received");

    Ok(Json(MessageResponse {
        message: "Update received".to_string(),
    }))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(ValidationError::Malformed(e.to_string())))
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Rejected(RejectReason),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Rejected(reason) => (StatusCode::NOT_FOUND, reason.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> Self {
        AppError::Rejected(reason)
    }
}
