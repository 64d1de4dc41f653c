//! Cross-context relay
//!
//! Carries control messages between the background context (session
//! coordinator) and the capture context (recorders):
//! - PROCESS_STREAM / STOP_ALL: requests, acknowledged before the sender proceeds
//! - SAVE_FILE / SESSION_COMPLETE: fire-and-forget events back to the background

pub mod channel;
pub mod messages;

pub use channel::{event_channel, request_channel, Envelope, EventSender, RelayClient, Responder};
pub use messages::{
    Ack, CaptureEvent, CaptureRequest, RecordingStateResponse, RelayMessage, UiMessage,
    UiResponse,
};
