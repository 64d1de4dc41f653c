use super::state::AppState;
use crate::capture::{check_permissions, StreamSpecification};
use crate::error::CaptureError;
use crate::relay::UiMessage;
use crate::session::{SavedFile, StreamOutcome};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartRecordingRequest {
    pub specifications: Vec<StreamSpecification>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartRecordingResponse {
    pub ok: bool,
    pub session_id: Option<Uuid>,
    pub streams: Vec<StreamOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopRecordingResponse {
    pub ok: bool,
    pub session_id: Option<Uuid>,
    pub files: Vec<SavedFile>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

fn error_response(status: StatusCode, error: &CaptureError) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn status_for(error: &CaptureError) -> StatusCode {
    match error {
        CaptureError::AlreadyActive | CaptureError::NotActive => StatusCode::CONFLICT,
        CaptureError::EmptySession | CaptureError::InvalidSpecification(_) => {
            StatusCode::BAD_REQUEST
        }
        CaptureError::RelayDelivery { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
/// Start a session recording the given stream specifications
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    info!(
        "Start requested for streams: {:?}",
        req.specifications.iter().map(|s| s.id.as_str()).collect::<Vec<_>>()
    );

    match state.coordinator.request_start(req.specifications).await {
        Ok(outcome) => {
            // Every stream refused: nothing to record
            let status = if outcome.ok {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            (
                status,
                Json(StartRecordingResponse {
                    ok: outcome.ok,
                    session_id: outcome.session_id,
                    streams: outcome.streams,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start recording: {}", e);
            error_response(status_for(&e), &e)
        }
    }
}

/// POST /recording/stop
/// Stop the active session once every recorder has flushed
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.request_stop().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(StopRecordingResponse {
                ok: true,
                session_id: outcome.session_id,
                files: outcome.files,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            error_response(status_for(&e), &e)
        }
    }
}

/// GET /recording/state
pub async fn get_recording_state(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.coordinator.snapshot().await))
}

/// POST /messages
/// Extension-style message dispatch; replies `{ok}` or `{active}`
pub async fn handle_message(
    State(state): State<AppState>,
    Json(message): Json<UiMessage>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(state.coordinator.handle_message(message).await))
}

/// GET /permissions
pub async fn get_permissions(State(state): State<AppState>) -> impl IntoResponse {
    let status = check_permissions(state.provider.as_ref()).await;
    (StatusCode::OK, Json(status))
}

/// GET /devices
pub async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    match state.provider.enumerate_devices().await {
        Ok(devices) => (StatusCode::OK, Json(devices)).into_response(),
        Err(e) => {
            error!("Device enumeration failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
