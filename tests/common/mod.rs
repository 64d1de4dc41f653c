// Shared test fixtures
//
// `ScriptedProvider` hands out tracks that count their stops and encoders
// that emit a fixed chunk script, so recorder output is exact.

#![allow(dead_code)]

use capture_relay::capture::{DeviceInfo, Encoder, MediaStream, MediaTrack, Readiness};
use capture_relay::{CaptureError, CaptureProvider, Result, TrackDescriptor, TrackKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
pub struct TrackCounters {
    pub acquired: Arc<AtomicUsize>,
    pub stopped: Arc<AtomicUsize>,
}

impl TrackCounters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct ScriptedProvider {
    pub chunks: Vec<Vec<u8>>,
    pub final_chunk: Option<Vec<u8>>,
    pub denied: Vec<TrackKind>,
    /// When set, streams never report live
    pub never_live: bool,
    /// When set, `acquire` never resolves, like an unanswered prompt
    pub hang_acquire: bool,
    /// Stream whose encoder delays its final flush after stop
    pub slow_flush: Option<(String, Duration)>,
    pub counters: TrackCounters,
}

impl ScriptedProvider {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            final_chunk: None,
            denied: Vec::new(),
            never_live: false,
            hang_acquire: false,
            slow_flush: None,
            counters: TrackCounters::default(),
        }
    }

    pub fn with_final_chunk(mut self, chunk: &[u8]) -> Self {
        self.final_chunk = Some(chunk.to_vec());
        self
    }

    pub fn deny(mut self, kind: TrackKind) -> Self {
        self.denied.push(kind);
        self
    }

    pub fn never_live(mut self) -> Self {
        self.never_live = true;
        self
    }

    pub fn hang_acquire(mut self) -> Self {
        self.hang_acquire = true;
        self
    }

    /// Delay the final chunk of `stream_id` by `delay` after stop
    pub fn slow_flush(mut self, stream_id: &str, delay: Duration) -> Self {
        self.slow_flush = Some((stream_id.to_string(), delay));
        self
    }
}

#[async_trait::async_trait]
impl CaptureProvider for ScriptedProvider {
    async fn acquire(&self, descriptor: &TrackDescriptor) -> Result<Box<dyn MediaTrack>> {
        if self.hang_acquire {
            std::future::pending::<()>().await;
        }
        if self.denied.contains(&descriptor.kind) {
            return Err(CaptureError::PermissionDenied {
                kind: descriptor.kind,
                reason: "denied by test".to_string(),
            });
        }

        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingTrack {
            kind: descriptor.kind,
            live: true,
            stopped: Arc::clone(&self.counters.stopped),
        }))
    }

    async fn wait_live(&self, _stream: &MediaStream, _settle: Duration) -> Readiness {
        if self.never_live {
            std::future::pending::<()>().await;
        }
        Readiness::Confirmed
    }

    fn open_encoder(&self, stream: &MediaStream, _mime_type: &str) -> Result<Box<dyn Encoder>> {
        let flush_delay = self
            .slow_flush
            .as_ref()
            .filter(|(id, _)| id == stream.id())
            .map(|(_, delay)| *delay);

        Ok(Box::new(ScriptedEncoder {
            chunks: self.chunks.clone(),
            final_chunk: self.final_chunk.clone(),
            flush_delay,
            tx: None,
        }))
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct CountingTrack {
    kind: TrackKind,
    live: bool,
    stopped: Arc<AtomicUsize>,
}

impl MediaTrack for CountingTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        "counting"
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct ScriptedEncoder {
    chunks: Vec<Vec<u8>>,
    final_chunk: Option<Vec<u8>>,
    flush_delay: Option<Duration>,
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

#[async_trait::async_trait]
impl Encoder for ScriptedEncoder {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<u8>>> {
        let (tx, rx) = mpsc::channel(self.chunks.len() + 2);
        for chunk in self.chunks.drain(..) {
            tx.send(chunk)
                .await
                .map_err(|_| CaptureError::encoder("receiver dropped"))?;
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            let chunk = self.final_chunk.take();
            match self.flush_delay {
                // Flush later; the channel closes when the task drops `tx`
                Some(delay) => {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(chunk) = chunk {
                            let _ = tx.send(chunk).await;
                        }
                    });
                }
                None => {
                    if let Some(chunk) = chunk {
                        let _ = tx.send(chunk).await;
                    }
                }
            }
        }
        Ok(())
    }

    fn is_encoding(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted-encoder"
    }
}

/// Poll `condition` until it holds or a second has passed
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
