use crate::capture::CaptureProvider;
use crate::session::SessionCoordinator;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session coordinator
    pub coordinator: Arc<SessionCoordinator>,

    /// Provider used for permission probes and device listing
    pub provider: Arc<dyn CaptureProvider>,
}

impl AppState {
    pub fn new(coordinator: Arc<SessionCoordinator>, provider: Arc<dyn CaptureProvider>) -> Self {
        Self {
            coordinator,
            provider,
        }
    }
}
