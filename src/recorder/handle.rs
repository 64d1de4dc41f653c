use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::error;

use super::recorder::{RecordedFile, Recorder};
use crate::capture::CaptureProvider;
use crate::relay::{CaptureEvent, EventSender};

/// What a recorder reports through its completion signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderOutcome {
    pub stream_id: String,
    pub filename: Option<String>,
    pub bytes: usize,
    pub chunk_count: usize,
    pub error: Option<String>,
}

impl RecorderOutcome {
    fn saved(file: &RecordedFile) -> Self {
        Self {
            stream_id: file.stream_id.clone(),
            filename: Some(file.filename.clone()),
            bytes: file.data.len(),
            chunk_count: file.chunk_count,
            error: None,
        }
    }

    fn failed(stream_id: &str, error: String) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            filename: None,
            bytes: 0,
            chunk_count: 0,
            error: Some(error),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.error.is_none()
    }
}

/// Handle to a recorder running in its own task
///
/// The task records until stopped, hands the file to the background as
/// SAVE_FILE, fires the completion signal, then releases the tracks.
pub struct RecorderHandle {
    stream_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
    completion: oneshot::Receiver<RecorderOutcome>,
}

impl RecorderHandle {
    /// Spawn the recording task for an acquired recorder
    pub fn spawn(
        mut recorder: Recorder,
        provider: Arc<dyn CaptureProvider>,
        settle_delay: Duration,
        events: EventSender,
    ) -> Self {
        let stream_id = recorder.stream_id().to_string();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = match recorder.record(provider.as_ref(), settle_delay, stop_rx).await {
                Ok(file) => {
                    let outcome = RecorderOutcome::saved(&file);
                    events
                        .send(CaptureEvent::SaveFile {
                            filename: file.filename,
                            file_data: file.data,
                        })
                        .await;
                    outcome
                }
                Err(e) => {
                    error!("Recorder {} failed: {}", recorder.stream_id(), e);
                    RecorderOutcome::failed(recorder.stream_id(), e.to_string())
                }
            };

            // Nobody waiting means the capture context is gone; tracks are
            // released regardless
            let _ = done_tx.send(outcome);
            recorder.release_tracks();
        });

        Self {
            stream_id,
            stop_tx: Some(stop_tx),
            completion: done_rx,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Ask the recorder to stop. Further calls do nothing.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    /// Wait for the recorder to flush and report
    pub async fn completion(self) -> RecorderOutcome {
        match self.completion.await {
            Ok(outcome) => outcome,
            Err(_) => RecorderOutcome::failed(
                &self.stream_id,
                "recorder task ended without completing".to_string(),
            ),
        }
    }
}
