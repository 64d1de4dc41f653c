use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::RecordingConfig;
use crate::capture::CaptureProvider;
use crate::offscreen::CaptureContext;
use crate::relay::{CaptureRequest, EventSender, RelayClient};

/// Creates and tears down the capture context on behalf of the coordinator
pub struct CaptureHost {
    provider: Arc<dyn CaptureProvider>,
    events: EventSender,
    config: RecordingConfig,
    running: Option<RunningContext>,
}

struct RunningContext {
    relay: RelayClient<CaptureRequest>,
    task: JoinHandle<()>,
}

impl CaptureHost {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        events: EventSender,
        config: RecordingConfig,
    ) -> Self {
        Self {
            provider,
            events,
            config,
            running: None,
        }
    }

    /// Relay to the capture context, creating the context if it does not exist
    pub fn ensure(&mut self) -> RelayClient<CaptureRequest> {
        if let Some(running) = &self.running {
            if !running.relay.is_closed() {
                return running.relay.clone();
            }
            error!("Capture context exited unexpectedly; creating a new one");
        }

        let context = CaptureContext::new(
            Arc::clone(&self.provider),
            self.events.clone(),
            self.config.settle_delay(),
        );
        let (relay, task) =
            context.spawn(self.config.relay_queue_capacity(), self.config.relay_timeout());
        info!("Capture context created");

        self.running = Some(RunningContext {
            relay: relay.clone(),
            task,
        });

        relay
    }

    /// Relay to the capture context if it is running; never creates one
    pub fn current(&self) -> Option<RelayClient<CaptureRequest>> {
        self.running
            .as_ref()
            .filter(|r| !r.relay.is_closed())
            .map(|r| r.relay.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|r| !r.relay.is_closed())
            .unwrap_or(false)
    }

    /// Tear the capture context down and wait for it to exit.
    ///
    /// A context stuck on a device request that never resolves is aborted
    /// once the close timeout elapses.
    pub async fn close(&mut self) {
        if let Some(running) = self.running.take() {
            // Dropping the last relay client ends the context's request loop
            drop(running.relay);

            let mut task = running.task;
            match tokio::time::timeout(self.config.close_timeout(), &mut task).await {
                Ok(Ok(())) => info!("Capture context closed"),
                Ok(Err(e)) => error!("Capture context task failed: {}", e),
                Err(_) => {
                    warn!(
                        "Capture context did not exit within {:?}; aborting",
                        self.config.close_timeout()
                    );
                    task.abort();
                    // Resolves promptly once aborted; the cancellation error is expected
                    let _ = task.await;
                }
            }
        }
    }
}
