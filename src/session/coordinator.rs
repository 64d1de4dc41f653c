use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::RecordingConfig;
use super::downloads::DownloadSink;
use super::host::CaptureHost;
use super::indicator::Indicator;
use super::state::{Session, SessionSnapshot};
use crate::capture::{CaptureProvider, StreamSpecification};
use crate::error::{CaptureError, Result};
use crate::relay::{
    event_channel, Ack, CaptureEvent, CaptureRequest, RecordingStateResponse, UiMessage,
    UiResponse,
};

/// Result of forwarding one specification to the capture context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOutcome {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartOutcome {
    /// True when at least one stream was accepted and the session is active
    pub ok: bool,
    pub session_id: Option<Uuid>,
    pub streams: Vec<StreamOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOutcome {
    pub session_id: Option<Uuid>,
    pub files: Vec<SavedFile>,
}

struct CoordinatorState {
    session: Session,
    host: CaptureHost,
}

/// Session coordinator (background context)
///
/// Single source of truth for whether a recording is in progress. Start and
/// stop hold the state lock for their whole duration, so intents are
/// handled one at a time. The active flag is mirrored outside the lock so
/// state queries answer while a start or stop is in flight.
pub struct SessionCoordinator {
    state: Mutex<CoordinatorState>,
    active: AtomicBool,
    indicator: Arc<dyn Indicator>,
    saved: Arc<Mutex<Vec<SavedFile>>>,
    completed: watch::Receiver<u64>,
    config: RecordingConfig,
}

impl SessionCoordinator {
    /// Create the coordinator and spawn its event loop
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        sink: Arc<dyn DownloadSink>,
        indicator: Arc<dyn Indicator>,
        config: RecordingConfig,
    ) -> Self {
        let (events, event_rx) = event_channel(config.event_queue_capacity());
        let (completed_tx, completed_rx) = watch::channel(0u64);
        let saved = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn(run_event_loop(
            event_rx,
            sink,
            Arc::clone(&saved),
            completed_tx,
        ));

        indicator.set_recording(false);

        Self {
            state: Mutex::new(CoordinatorState {
                session: Session::default(),
                host: CaptureHost::new(provider, events, config.clone()),
            }),
            active: AtomicBool::new(false),
            indicator,
            saved,
            completed: completed_rx,
            config,
        }
    }

    /// Start a session recording every specification.
    ///
    /// Specifications are forwarded one at a time; each is acknowledged once
    /// its tracks are acquired and its recorder task runs. A stream that
    /// fails does not affect its siblings. If none is accepted the session
    /// is rolled back and the outcome is not ok.
    pub async fn request_start(
        &self,
        specifications: Vec<StreamSpecification>,
    ) -> Result<StartOutcome> {
        let mut state = self.state.lock().await;

        if state.session.is_active() {
            warn!("Start rejected: a recording session is already active");
            return Err(CaptureError::AlreadyActive);
        }
        if specifications.is_empty() {
            return Err(CaptureError::EmptySession);
        }
        for (i, spec) in specifications.iter().enumerate() {
            if specifications[..i].iter().any(|s| s.id == spec.id) {
                return Err(CaptureError::InvalidSpecification(format!(
                    "stream id {} appears more than once",
                    spec.id
                )));
            }
        }

        let session_id = state.session.activate(specifications.clone());
        self.active.store(true, Ordering::SeqCst);
        self.indicator.set_recording(true);
        self.saved.lock().await.clear();

        info!(
            "Starting session {} with {} streams",
            session_id,
            specifications.len()
        );

        let mut streams = Vec::with_capacity(specifications.len());
        {
            let relay = state.host.ensure();

            for specification in specifications {
                let id = specification.id.clone();
                let outcome = match relay
                    .request(CaptureRequest::ProcessStream { specification })
                    .await
                {
                    Ok(ack) if ack.ok => StreamOutcome {
                        id,
                        ok: true,
                        error: None,
                    },
                    Ok(ack) => StreamOutcome {
                        id,
                        ok: false,
                        error: Some(ack.error.unwrap_or_else(|| "rejected".to_string())),
                    },
                    Err(e) => StreamOutcome {
                        id,
                        ok: false,
                        error: Some(e.to_string()),
                    },
                };

                match &outcome.error {
                    None => info!("Stream {} accepted", outcome.id),
                    Some(e) => warn!("Stream {} failed: {}", outcome.id, e),
                }
                streams.push(outcome);
            }
        }

        let accepted: Vec<String> = streams
            .iter()
            .filter(|s| s.ok)
            .map(|s| s.id.clone())
            .collect();

        if accepted.is_empty() {
            warn!("No stream could be started; rolling back session {}", session_id);
            state.host.close().await;
            state.session.deactivate();
            self.active.store(false, Ordering::SeqCst);
            self.indicator.set_recording(false);

            return Ok(StartOutcome {
                ok: false,
                session_id: None,
                streams,
            });
        }

        state.session.retain_accepted(&accepted);
        info!(
            "Session {} recording {} of {} streams",
            session_id,
            accepted.len(),
            streams.len()
        );

        Ok(StartOutcome {
            ok: true,
            session_id: Some(session_id),
            streams,
        })
    }

    /// Stop the active session.
    ///
    /// Returns after every recorder has flushed and every file it produced
    /// has been persisted. A relay failure still ends the session locally;
    /// the error is returned after the reset.
    pub async fn request_stop(&self) -> Result<StopOutcome> {
        let mut state = self.state.lock().await;

        if !state.session.is_active() {
            warn!("Stop rejected: no recording session is active");
            return Err(CaptureError::NotActive);
        }

        let session_id = state.session.session_id();
        let expected = state.session.specifications().len();
        info!("Stopping session {:?} ({} streams)", session_id, expected);

        let mut completed = self.completed.clone();
        let generation = *completed.borrow_and_update();

        let result = match state.host.current() {
            Some(relay) => {
                relay
                    .request_within(CaptureRequest::StopAll, self.config.stop_timeout())
                    .await
            }
            None => Err(CaptureError::relay(
                "STOP_ALL",
                "capture context is not running",
            )),
        };

        if result.is_ok() {
            // SESSION_COMPLETE trails every SAVE_FILE of this session
            let waited = tokio::time::timeout(self.config.completion_timeout(), async {
                completed.wait_for(|g| *g > generation).await.map(|_| ())
            })
            .await;

            match waited {
                Ok(Ok(())) => debug!("Session {:?} complete", session_id),
                Ok(Err(_)) => error!("Background event loop is gone"),
                Err(_) => warn!(
                    "SESSION_COMPLETE not seen within {:?}",
                    self.config.completion_timeout()
                ),
            }
        }

        state.host.close().await;
        state.session.deactivate();
        self.active.store(false, Ordering::SeqCst);
        self.indicator.set_recording(false);

        let files = std::mem::take(&mut *self.saved.lock().await);
        if files.len() != expected {
            warn!(
                "Session {:?} produced {} files for {} streams",
                session_id,
                files.len(),
                expected
            );
        }

        let ack = result?;
        if !ack.ok {
            warn!("STOP_ALL acknowledged with error: {:?}", ack.error);
        }

        info!("Session {:?} stopped, {} files saved", session_id, files.len());

        Ok(StopOutcome { session_id, files })
    }

    /// Whether a session is active. Never waits on an in-flight start or stop.
    pub async fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.session.snapshot()
    }

    pub async fn capture_context_running(&self) -> bool {
        self.state.lock().await.host.is_running()
    }

    /// Handle a UI message and produce its reply
    pub async fn handle_message(&self, message: UiMessage) -> UiResponse {
        match message {
            UiMessage::StartRecording { specifications } => {
                match self.request_start(specifications).await {
                    Ok(outcome) if outcome.ok => UiResponse::Ack(Ack::ok()),
                    Ok(outcome) => {
                        let errors: Vec<String> = outcome
                            .streams
                            .iter()
                            .filter_map(|s| s.error.as_ref().map(|e| format!("{}: {}", s.id, e)))
                            .collect();
                        UiResponse::Ack(Ack::failed(errors.join("; ")))
                    }
                    Err(e) => UiResponse::Ack(Ack::failed(e.to_string())),
                }
            }
            UiMessage::StopRecording => match self.request_stop().await {
                Ok(_) => UiResponse::Ack(Ack::ok()),
                Err(e) => UiResponse::Ack(Ack::failed(e.to_string())),
            },
            UiMessage::GetRecordingState => UiResponse::State(RecordingStateResponse {
                active: self.is_active().await,
            }),
        }
    }
}

/// Background side of the relay: persists SAVE_FILE payloads and counts
/// SESSION_COMPLETE signals, strictly in arrival order
async fn run_event_loop(
    mut events: mpsc::Receiver<CaptureEvent>,
    sink: Arc<dyn DownloadSink>,
    saved: Arc<Mutex<Vec<SavedFile>>>,
    completed: watch::Sender<u64>,
) {
    debug!("Background event loop started");

    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::SaveFile {
                filename,
                file_data,
            } => match sink.save(&filename, &file_data).await {
                Ok(path) => {
                    saved.lock().await.push(SavedFile {
                        filename,
                        path,
                        bytes: file_data.len(),
                    });
                }
                Err(e) => error!("Failed to save {}: {:#}", filename, e),
            },
            CaptureEvent::SessionComplete => {
                completed.send_modify(|generation| *generation += 1);
                info!("Capture session complete");
            }
        }
    }

    debug!("Background event loop stopped");
}
