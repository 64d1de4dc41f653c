use thiserror::Error;

use crate::capture::TrackKind;
use crate::recorder::RecorderState;

/// Errors raised across the capture, relay, recorder and session layers
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device or display access refused by the capture provider
    #[error("Permission denied for {kind} track: {reason}")]
    PermissionDenied { kind: TrackKind, reason: String },

    /// Requested device is missing or busy
    #[error("Device unavailable for {kind} track: {reason}")]
    DeviceUnavailable { kind: TrackKind, reason: String },

    /// Some but not all tracks of a specification were obtained
    #[error("Stream {stream_id} acquired {acquired} of {requested} tracks")]
    PartialAcquisition {
        stream_id: String,
        acquired: usize,
        requested: usize,
    },

    /// Session lifecycle errors
    #[error("A recording session is already active")]
    AlreadyActive,

    #[error("No recording session is active")]
    NotActive,

    #[error("Stream {0} is already recording")]
    DuplicateStream(String),

    #[error("Stream specification list is empty")]
    EmptySession,

    #[error("Invalid stream specification: {0}")]
    InvalidSpecification(String),

    /// Message unacknowledged or channel closed
    #[error("Relay delivery failed for {message}: {reason}")]
    RelayDelivery { message: String, reason: String },

    #[error("Recorder transition {from:?} -> {to:?} is not allowed")]
    InvalidTransition { from: RecorderState, to: RecorderState },

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Failed to persist {filename}: {reason}")]
    Persistence { filename: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results using CaptureError
pub type Result<T> = std::result::Result<T, CaptureError>;

impl CaptureError {
    pub fn relay(message: impl Into<String>, reason: impl Into<String>) -> Self {
        CaptureError::RelayDelivery {
            message: message.into(),
            reason: reason.into(),
        }
    }

    pub fn encoder(msg: impl Into<String>) -> Self {
        CaptureError::Encoder(msg.into())
    }

    /// Whether the failure came from the user refusing access
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CaptureError::PermissionDenied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaptureError::PermissionDenied {
            kind: TrackKind::Video,
            reason: "user dismissed prompt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Permission denied for video track: user dismissed prompt"
        );
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_partial_acquisition_display() {
        let err = CaptureError::PartialAcquisition {
            stream_id: "screen".to_string(),
            acquired: 1,
            requested: 2,
        };
        assert_eq!(err.to_string(), "Stream screen acquired 1 of 2 tracks");
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_relay_helper() {
        let err = CaptureError::relay("STOP_ALL", "channel closed");
        assert!(matches!(err, CaptureError::RelayDelivery { .. }));
        assert_eq!(
            err.to_string(),
            "Relay delivery failed for STOP_ALL: channel closed"
        );
    }
}
