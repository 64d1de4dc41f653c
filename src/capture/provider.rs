use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::stream::{MediaStream, TrackDescriptor, TrackKind};
use crate::error::Result;

/// Container candidates, most preferred first
const VIDEO_MIME_TYPES: &[&str] = &["video/webm;codecs=vp8,opus", "video/webm"];
const AUDIO_MIME_TYPES: &[&str] = &["audio/webm;codecs=opus", "audio/webm"];

/// A single live track handed out by a capture provider
pub trait MediaTrack: Send + Sync {
    fn kind(&self) -> TrackKind;

    /// Human readable device label
    fn label(&self) -> &str;

    fn is_live(&self) -> bool;

    /// Stop the track and release the device. Stopping an ended track is a
    /// no-op.
    fn stop(&mut self);
}

/// How a stream was judged live before encoding started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The provider reported the stream live
    Confirmed,
    /// No readiness signal available; a settle delay elapsed instead
    Assumed(Duration),
}

/// Kind of media device reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    VideoInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

/// Media capture provider trait
///
/// Implementations:
/// - Synthetic: deterministic chunks, for demos and tests
/// - Platform providers wrap the host's device, display and encoder APIs
#[async_trait::async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Acquire one track matching the descriptor
    async fn acquire(&self, descriptor: &TrackDescriptor) -> Result<Box<dyn MediaTrack>>;

    /// Wait until the stream is live.
    ///
    /// The default waits `settle` and assumes the stream is live by then.
    /// This is a heuristic, not a guarantee; providers with a real
    /// readiness signal should override it.
    async fn wait_live(&self, _stream: &MediaStream, settle: Duration) -> Readiness {
        tokio::time::sleep(settle).await;
        Readiness::Assumed(settle)
    }

    /// Create an encoder for the stream. Encoding starts on `Encoder::start`.
    fn open_encoder(&self, stream: &MediaStream, mime_type: &str) -> Result<Box<dyn Encoder>>;

    fn is_type_supported(&self, _mime_type: &str) -> bool {
        true
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Stream encoder trait
///
/// Contract: after `stop`, the encoder emits any remaining chunks and then
/// closes the channel returned by `start`.
#[async_trait::async_trait]
pub trait Encoder: Send {
    /// Start encoding
    ///
    /// Returns a channel receiver that will receive encoded chunks in
    /// production order
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<u8>>>;

    /// Request the encoder to flush and close its channel
    async fn stop(&mut self) -> Result<()>;

    fn is_encoding(&self) -> bool;

    /// Get encoder name for logging
    fn name(&self) -> &str;
}

/// Pick the first container the provider supports. Falls back to the last
/// candidate, which every webm-capable encoder accepts.
pub fn select_mime_type(provider: &dyn CaptureProvider, has_video: bool) -> &'static str {
    let candidates = if has_video {
        VIDEO_MIME_TYPES
    } else {
        AUDIO_MIME_TYPES
    };

    candidates
        .iter()
        .copied()
        .find(|mime| provider.is_type_supported(mime))
        .unwrap_or(candidates[candidates.len() - 1])
}

/// File extension for a MIME type, ignoring codec parameters
pub fn container_extension(mime_type: &str) -> &'static str {
    let container = mime_type.split(';').next().unwrap_or_default().trim();
    match container {
        "video/webm" | "audio/webm" => "webm",
        "video/mp4" | "audio/mp4" => "mp4",
        "audio/ogg" => "ogg",
        "video/x-matroska" => "mkv",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_extension() {
        assert_eq!(container_extension("video/webm;codecs=vp8,opus"), "webm");
        assert_eq!(container_extension("audio/webm"), "webm");
        assert_eq!(container_extension("video/mp4"), "mp4");
        assert_eq!(container_extension("application/octet-stream"), "bin");
    }
}
