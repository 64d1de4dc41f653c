// Synthetic capture provider
//
// Produces deterministic chunks ("<stream-id>:<seq>;") on a fixed interval
// so the whole recording lifecycle can run without real devices.

use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::provider::{CaptureProvider, DeviceInfo, DeviceKind, Encoder, MediaTrack, Readiness};
use super::stream::{MediaStream, TrackDescriptor, TrackKind};
use crate::error::{CaptureError, Result};

/// Configuration for the synthetic provider
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Interval between produced chunks in milliseconds
    pub chunk_interval_ms: u64,

    /// Track kinds for which access is refused
    pub denied: Vec<TrackKind>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            chunk_interval_ms: 100,
            denied: Vec::new(),
        }
    }
}

pub struct SyntheticProvider {
    config: SyntheticConfig,
}

impl SyntheticProvider {
    pub fn new(config: SyntheticConfig) -> Self {
        info!(
            "Synthetic provider initialized (chunk every {}ms, denied: {:?})",
            config.chunk_interval_ms, config.denied
        );
        Self { config }
    }

    /// Refuse access for a track kind, as if the user dismissed the prompt
    pub fn deny(mut self, kind: TrackKind) -> Self {
        if !self.config.denied.contains(&kind) {
            self.config.denied.push(kind);
        }
        self
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

#[async_trait::async_trait]
impl CaptureProvider for SyntheticProvider {
    async fn acquire(&self, descriptor: &TrackDescriptor) -> Result<Box<dyn MediaTrack>> {
        if self.config.denied.contains(&descriptor.kind) {
            return Err(CaptureError::PermissionDenied {
                kind: descriptor.kind,
                reason: "access refused by synthetic provider".to_string(),
            });
        }

        let label = descriptor
            .constraints
            .get("deviceId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| match descriptor.kind {
                TrackKind::Audio => "Synthetic Microphone".to_string(),
                TrackKind::Video => "Synthetic Camera".to_string(),
            });

        Ok(Box::new(SyntheticTrack {
            kind: descriptor.kind,
            label,
            live: true,
        }))
    }

    async fn wait_live(&self, _stream: &MediaStream, _settle: Duration) -> Readiness {
        // Synthetic tracks are live as soon as they exist
        Readiness::Confirmed
    }

    fn open_encoder(&self, stream: &MediaStream, mime_type: &str) -> Result<Box<dyn Encoder>> {
        Ok(Box::new(SyntheticEncoder::new(
            stream.id().to_string(),
            mime_type.to_string(),
            Duration::from_millis(self.config.chunk_interval_ms.max(1)),
        )))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(vec![
            DeviceInfo {
                device_id: "synthetic-mic".to_string(),
                kind: DeviceKind::AudioInput,
                label: "Synthetic Microphone".to_string(),
            },
            DeviceInfo {
                device_id: "synthetic-cam".to_string(),
                kind: DeviceKind::VideoInput,
                label: "Synthetic Camera".to_string(),
            },
            DeviceInfo {
                device_id: "synthetic-out".to_string(),
                kind: DeviceKind::AudioOutput,
                label: "Synthetic Speakers".to_string(),
            },
        ])
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

struct SyntheticTrack {
    kind: TrackKind,
    label: String,
    live: bool,
}

impl MediaTrack for SyntheticTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if self.live {
            debug!("Synthetic {} track stopped: {}", self.kind, self.label);
            self.live = false;
        }
    }
}

/// Emits one chunk per interval until stopped, then a final chunk
struct SyntheticEncoder {
    stream_id: String,
    mime_type: String,
    interval: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SyntheticEncoder {
    fn new(stream_id: String, mime_type: String, interval: Duration) -> Self {
        Self {
            stream_id,
            mime_type,
            interval,
            stop_tx: None,
        }
    }
}

#[async_trait::async_trait]
impl Encoder for SyntheticEncoder {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<u8>>> {
        if self.stop_tx.is_some() {
            return Err(CaptureError::encoder("synthetic encoder already started"));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let stream_id = self.stream_id.clone();
        let interval = self.interval;

        debug!("Synthetic encoder starting: {} ({})", stream_id, self.mime_type);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;

            let mut seq = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let chunk = format!("{}:{};", stream_id, seq).into_bytes();
                        if chunk_tx.send(chunk).await.is_err() {
                            return;
                        }
                        seq += 1;
                    }
                }
            }

            // Final flush, then the sender drops and closes the channel
            let _ = chunk_tx.send(format!("{}:{};", stream_id, seq).into_bytes()).await;
        });

        self.stop_tx = Some(stop_tx);

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The producer may already be gone if the receiver was dropped
            let _ = stop_tx.send(());
        }
        Ok(())
    }

    fn is_encoding(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn name(&self) -> &str {
        "synthetic-encoder"
    }
}
