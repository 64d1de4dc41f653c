use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::buffer::ChunkBuffer;
use super::state::RecorderState;
use crate::capture::{
    container_extension, output_filename, select_mime_type, CaptureProvider, MediaStream,
    Readiness, StreamSpecification,
};
use crate::error::{CaptureError, Result};

/// A finished recording, ready to be handed to the background for download
#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub stream_id: String,
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub chunk_count: usize,
}

/// Recorder wrapper
///
/// Owns the stream of one specification, buffers the encoder's chunks in
/// arrival order and assembles them into a single file on stop. A recorder
/// is used for exactly one recording; once `Finished` it is discarded.
pub struct Recorder {
    spec: StreamSpecification,
    state: RecorderState,
    stream: Option<MediaStream>,
    buffer: ChunkBuffer,
    mime_type: String,
    filename: String,
}

impl Recorder {
    pub fn new(spec: StreamSpecification) -> Self {
        Self {
            spec,
            state: RecorderState::Idle,
            stream: None,
            buffer: ChunkBuffer::new(),
            mime_type: String::new(),
            filename: String::new(),
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.spec.id
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Output filename; known once acquisition succeeded
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Acquire every track of the specification, in order.
    ///
    /// All or nothing: if any track is refused, the tracks already granted
    /// are released and the recorder finishes without recording.
    pub async fn acquire(&mut self, provider: &dyn CaptureProvider) -> Result<()> {
        self.transition(RecorderState::Acquiring)?;

        if self.spec.tracks.is_empty() {
            let err = CaptureError::InvalidSpecification(format!(
                "stream {} requests no tracks",
                self.spec.id
            ));
            return Err(self.abort(err));
        }

        let tracks = self.spec.tracks.clone();
        let requested = tracks.len();
        let mut stream = MediaStream::new(self.spec.id.clone());

        for descriptor in &tracks {
            let result = match provider.acquire(descriptor).await {
                Ok(track) if track.kind() != descriptor.kind => {
                    let mut track = track;
                    track.stop();
                    Err(CaptureError::DeviceUnavailable {
                        kind: descriptor.kind,
                        reason: format!("provider returned a {} track", track.kind()),
                    })
                }
                other => other,
            };

            match result {
                Ok(track) => {
                    debug!(
                        "Stream {}: acquired {} track '{}'",
                        self.spec.id,
                        track.kind(),
                        track.label()
                    );
                    stream.add_track(track);
                }
                Err(e) => {
                    let acquired = stream.track_count();
                    warn!(
                        "Stream {}: {} track refused after {} of {} acquired: {}",
                        self.spec.id, descriptor.kind, acquired, requested, e
                    );
                    stream.release();

                    let err = if acquired == 0 {
                        e
                    } else {
                        CaptureError::PartialAcquisition {
                            stream_id: self.spec.id.clone(),
                            acquired,
                            requested,
                        }
                    };
                    return Err(self.abort(err));
                }
            }
        }

        self.mime_type = select_mime_type(provider, stream.has_video()).to_string();
        self.filename = match &self.spec.filename {
            Some(name) => name.clone(),
            None => output_filename(&self.spec.id, container_extension(&self.mime_type)),
        };
        self.stream = Some(stream);

        info!(
            "Stream {} acquired {} tracks ({}, -> {})",
            self.spec.id, requested, self.mime_type, self.filename
        );

        Ok(())
    }

    /// Record until `stop_rx` fires (or its sender is dropped), then flush.
    ///
    /// Waits for the stream to go live first; a stop during that wait
    /// finishes the recorder with an empty file.
    pub async fn record(
        &mut self,
        provider: &dyn CaptureProvider,
        settle_delay: Duration,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> Result<RecordedFile> {
        let readiness = {
            let stream = match (&self.stream, self.state) {
                (Some(stream), RecorderState::Acquiring) => stream,
                _ => {
                    return Err(CaptureError::InvalidTransition {
                        from: self.state,
                        to: RecorderState::Active,
                    })
                }
            };

            tokio::select! {
                readiness = provider.wait_live(stream, settle_delay) => Some(readiness),
                _ = &mut stop_rx => None,
            }
        };

        match readiness {
            Some(Readiness::Confirmed) => debug!("Stream {} confirmed live", self.spec.id),
            Some(Readiness::Assumed(delay)) => {
                debug!("Stream {} assumed live after {:?}", self.spec.id, delay)
            }
            None => {
                info!("Stream {} stopped before it went live", self.spec.id);
                self.transition(RecorderState::Stopping)?;
                return self.finish();
            }
        }

        let encoder = match &self.stream {
            Some(stream) => provider.open_encoder(stream, &self.mime_type),
            None => Err(CaptureError::encoder("stream released before encoding")),
        };
        let mut encoder = match encoder {
            Ok(encoder) => encoder,
            Err(e) => return Err(self.abort(e)),
        };

        let mut chunk_rx = match encoder.start().await {
            Ok(rx) => rx,
            Err(e) => return Err(self.abort(e)),
        };

        self.transition(RecorderState::Active)?;
        info!("Recorder {} active ({})", self.spec.id, encoder.name());

        let mut source_ended = false;
        loop {
            tokio::select! {
                chunk = chunk_rx.recv() => match chunk {
                    Some(chunk) => {
                        self.buffer.push(chunk);
                    }
                    None => {
                        source_ended = true;
                        break;
                    }
                },
                _ = &mut stop_rx => break,
            }
        }

        self.transition(RecorderState::Stopping)?;
        if source_ended {
            warn!("Recorder {}: encoder closed before stop", self.spec.id);
        }

        if let Err(e) = encoder.stop().await {
            warn!("Recorder {}: failed to stop encoder: {}", self.spec.id, e);
        }

        // Drain until the encoder closes its channel so the last chunk lands
        while let Some(chunk) = chunk_rx.recv().await {
            self.buffer.push(chunk);
        }

        self.finish()
    }

    /// Stop every track of the stream. Safe to call repeatedly.
    pub fn release_tracks(&mut self) -> usize {
        match &mut self.stream {
            Some(stream) => {
                let released = stream.release();
                if released > 0 {
                    debug!("Stream {}: released {} tracks", self.spec.id, released);
                }
                released
            }
            None => 0,
        }
    }

    fn finish(&mut self) -> Result<RecordedFile> {
        self.transition(RecorderState::Finished)?;

        let buffer = std::mem::take(&mut self.buffer);
        let chunk_count = buffer.len();
        let data = buffer.assemble();

        info!(
            "Recorder {} finished: {} chunks, {} bytes",
            self.spec.id,
            chunk_count,
            data.len()
        );

        Ok(RecordedFile {
            stream_id: self.spec.id.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            data,
            chunk_count,
        })
    }

    /// Walk the state machine down to `Finished` after a failure
    fn abort(&mut self, err: CaptureError) -> CaptureError {
        self.release_tracks();
        if self.state.can_transition_to(RecorderState::Stopping) {
            self.state = RecorderState::Stopping;
        }
        if self.state.can_transition_to(RecorderState::Finished) {
            self.state = RecorderState::Finished;
        }
        err
    }

    fn transition(&mut self, next: RecorderState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CaptureError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        debug!("Recorder {}: {:?} -> {:?}", self.spec.id, self.state, next);
        self.state = next;
        Ok(())
    }
}
