use serde::{Deserialize, Serialize};

use crate::capture::StreamSpecification;

/// Intents issued by the UI to the session coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiMessage {
    StartRecording {
        specifications: Vec<StreamSpecification>,
    },
    StopRecording,
    GetRecordingState,
}

/// Requests the coordinator sends to the capture context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureRequest {
    ProcessStream {
        #[serde(flatten)]
        specification: StreamSpecification,
    },
    StopAll,
}

/// Fire-and-forget notifications from the capture context to the background
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureEvent {
    SaveFile {
        filename: String,
        #[serde(rename = "fileData", with = "base64_bytes")]
        file_data: Vec<u8>,
    },
    SessionComplete,
}

/// Acknowledgement returned for every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStateResponse {
    pub active: bool,
}

/// Reply to a UI message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiResponse {
    Ack(Ack),
    State(RecordingStateResponse),
}

/// Message name used in logs and relay errors
pub trait RelayMessage: Send + 'static {
    fn kind(&self) -> &'static str;
}

impl RelayMessage for CaptureRequest {
    fn kind(&self) -> &'static str {
        match self {
            CaptureRequest::ProcessStream { .. } => "PROCESS_STREAM",
            CaptureRequest::StopAll => "STOP_ALL",
        }
    }
}

impl RelayMessage for CaptureEvent {
    fn kind(&self) -> &'static str {
        match self {
            CaptureEvent::SaveFile { .. } => "SAVE_FILE",
            CaptureEvent::SessionComplete => "SESSION_COMPLETE",
        }
    }
}

/// File payloads travel base64-encoded in JSON
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
