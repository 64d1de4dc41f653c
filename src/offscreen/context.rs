use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::capture::{CaptureProvider, StreamSpecification};
use crate::error::{CaptureError, Result};
use crate::recorder::{Recorder, RecorderHandle, RecorderOutcome};
use crate::relay::{
    request_channel, Ack, CaptureEvent, CaptureRequest, Envelope, EventSender, RelayClient,
};

/// The context allowed to hold live media handles
///
/// Handles one request at a time, in arrival order. Recorders run in their
/// own tasks; only their files leave this context, as SAVE_FILE events.
pub struct CaptureContext {
    provider: Arc<dyn CaptureProvider>,
    events: EventSender,
    settle_delay: Duration,
    recorders: Vec<RecorderHandle>,
}

impl CaptureContext {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        events: EventSender,
        settle_delay: Duration,
    ) -> Self {
        Self {
            provider,
            events,
            settle_delay,
            recorders: Vec::new(),
        }
    }

    /// Run the context in a task and return the relay that reaches it
    pub fn spawn(
        self,
        queue_capacity: usize,
        ack_timeout: Duration,
    ) -> (RelayClient<CaptureRequest>, JoinHandle<()>) {
        let (client, rx) = request_channel(queue_capacity, ack_timeout);
        let handle = tokio::spawn(self.run(rx));
        (client, handle)
    }

    async fn run(mut self, mut requests: mpsc::Receiver<Envelope<CaptureRequest>>) {
        info!("Capture context started (provider: {})", self.provider.name());

        while let Some(envelope) = requests.recv().await {
            let (message, responder) = envelope.into_parts();

            let ack = match message {
                CaptureRequest::ProcessStream { specification } => {
                    let stream_id = specification.id.clone();
                    match self.process_stream(specification).await {
                        Ok(()) => Ack::ok(),
                        Err(e) => {
                            warn!("Stream {} not started: {}", stream_id, e);
                            Ack::failed(e.to_string())
                        }
                    }
                }
                CaptureRequest::StopAll => {
                    self.stop_all().await;
                    self.events.send(CaptureEvent::SessionComplete).await;
                    Ack::ok()
                }
            };

            responder.reply(ack);
        }

        // Relay closed: the background tore this context down
        if !self.recorders.is_empty() {
            warn!(
                "Capture context closing with {} recorders still running",
                self.recorders.len()
            );
            self.stop_all().await;
        }

        info!("Capture context closed");
    }

    /// Acquire the tracks of one specification and start its recorder.
    ///
    /// Returns once the recorder task is running; encoding itself begins
    /// after the stream is live.
    pub async fn process_stream(&mut self, specification: StreamSpecification) -> Result<()> {
        if self
            .recorders
            .iter()
            .any(|r| r.stream_id() == specification.id)
        {
            return Err(CaptureError::DuplicateStream(specification.id));
        }

        let mut recorder = Recorder::new(specification);
        recorder.acquire(self.provider.as_ref()).await?;

        let handle = RecorderHandle::spawn(
            recorder,
            Arc::clone(&self.provider),
            self.settle_delay,
            self.events.clone(),
        );
        self.recorders.push(handle);

        Ok(())
    }

    /// Stop every recorder and wait for all of them to flush
    pub async fn stop_all(&mut self) -> Vec<RecorderOutcome> {
        let mut recorders = std::mem::take(&mut self.recorders);
        info!("Stopping {} recorders", recorders.len());

        for recorder in &mut recorders {
            recorder.stop();
        }

        let outcomes = join_all(recorders.into_iter().map(RecorderHandle::completion)).await;

        let failed = outcomes.iter().filter(|o| !o.is_saved()).count();
        if failed > 0 {
            warn!("{} of {} recorders failed", failed, outcomes.len());
        }
        info!("All {} recorders flushed", outcomes.len());

        outcomes
    }

    pub fn recorder_count(&self) -> usize {
        self.recorders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{SyntheticConfig, SyntheticProvider, TrackDescriptor};
    use crate::relay::event_channel;

    fn provider() -> Arc<dyn CaptureProvider> {
        Arc::new(SyntheticProvider::new(SyntheticConfig {
            chunk_interval_ms: 5,
            denied: Vec::new(),
        }))
    }

    fn mic() -> StreamSpecification {
        StreamSpecification::new("mic", vec![TrackDescriptor::audio()])
    }

    #[tokio::test]
    async fn test_duplicate_stream_is_rejected() {
        let (events, _event_rx) = event_channel(8);
        let mut context = CaptureContext::new(provider(), events, Duration::ZERO);

        context.process_stream(mic()).await.unwrap();
        let err = context.process_stream(mic()).await.unwrap_err();
        assert!(matches!(err, CaptureError::DuplicateStream(id) if id == "mic"));
        assert_eq!(context.recorder_count(), 1);

        let outcomes = context.stop_all().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(context.recorder_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_all_without_recorders_still_completes() {
        let (events, mut event_rx) = event_channel(8);
        let context = CaptureContext::new(provider(), events, Duration::ZERO);
        let (relay, task) = context.spawn(4, Duration::from_secs(1));

        let ack = relay.request(CaptureRequest::StopAll).await.unwrap();
        assert!(ack.ok);
        assert!(matches!(
            event_rx.recv().await,
            Some(CaptureEvent::SessionComplete)
        ));

        drop(relay);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_files_precede_session_complete() {
        let (events, mut event_rx) = event_channel(8);
        let context = CaptureContext::new(provider(), events, Duration::ZERO);
        let (relay, task) = context.spawn(4, Duration::from_secs(1));

        for spec in [
            mic(),
            StreamSpecification::new("cam", vec![TrackDescriptor::video()]),
        ] {
            let ack = relay
                .request(CaptureRequest::ProcessStream {
                    specification: spec,
                })
                .await
                .unwrap();
            assert!(ack.ok);
        }

        assert!(relay.request(CaptureRequest::StopAll).await.unwrap().ok);

        let mut saved = 0;
        loop {
            match event_rx.recv().await.unwrap() {
                CaptureEvent::SaveFile { .. } => saved += 1,
                CaptureEvent::SessionComplete => break,
            }
        }
        assert_eq!(saved, 2);

        drop(relay);
        task.await.unwrap();
    }
}
