use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture environment
        .route("/permissions", get(handlers::get_permissions))
        .route("/devices", get(handlers::list_devices))
        // Recording control
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/state", get(handlers::get_recording_state))
        // Extension-style message endpoint
        .route("/messages", post(handlers::handle_message))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The popup runs on its own origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
