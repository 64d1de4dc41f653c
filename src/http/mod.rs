//! HTTP API for the recording UI
//!
//! This module provides a REST API standing in for the extension popup:
//! - GET /health - Health check
//! - GET /permissions - Microphone/camera access probe
//! - GET /devices - Available capture devices
//! - POST /recording/start - Start a session
//! - POST /recording/stop - Stop the session
//! - GET /recording/state - Query session state
//! - POST /messages - START_RECORDING / STOP_RECORDING / GET_RECORDING_STATE

mod handlers;
mod routes;
mod state;

pub use handlers::{StartRecordingRequest, StartRecordingResponse, StopRecordingResponse};
pub use routes::create_router;
pub use state::AppState;
