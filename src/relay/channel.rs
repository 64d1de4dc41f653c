use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use super::messages::{Ack, CaptureEvent, RelayMessage};
use crate::error::{CaptureError, Result};

/// A request plus the slot its acknowledgement goes into
pub struct Envelope<M> {
    pub message: M,
    reply: oneshot::Sender<Ack>,
}

impl<M: RelayMessage> Envelope<M> {
    /// Answer the request. A requester that already gave up is only logged.
    pub fn reply(self, ack: Ack) {
        let kind = self.message.kind();
        if self.reply.send(ack).is_err() {
            warn!("Requester for {} went away before the acknowledgement", kind);
        }
    }

    /// Split into the message and a responder, for handlers that need to
    /// own the message while answering later
    pub fn into_parts(self) -> (M, Responder) {
        let kind = self.message.kind();
        (
            self.message,
            Responder {
                kind,
                reply: self.reply,
            },
        )
    }
}

pub struct Responder {
    kind: &'static str,
    reply: oneshot::Sender<Ack>,
}

impl Responder {
    pub fn reply(self, ack: Ack) {
        if self.reply.send(ack).is_err() {
            warn!(
                "Requester for {} went away before the acknowledgement",
                self.kind
            );
        }
    }
}

/// Sending half of a request/acknowledge relay
///
/// Delivery is at-most-once: nothing is retried. A closed channel, a dropped
/// reply slot, or no acknowledgement within the timeout is reported as
/// `RelayDelivery` and logged.
pub struct RelayClient<M> {
    tx: mpsc::Sender<Envelope<M>>,
    ack_timeout: Duration,
}

impl<M> Clone for RelayClient<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            ack_timeout: self.ack_timeout,
        }
    }
}

/// Create a request relay with room for `capacity` queued requests
pub fn request_channel<M>(
    capacity: usize,
    ack_timeout: Duration,
) -> (RelayClient<M>, mpsc::Receiver<Envelope<M>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (RelayClient { tx, ack_timeout }, rx)
}

impl<M: RelayMessage> RelayClient<M> {
    /// Send a request and wait for its acknowledgement
    pub async fn request(&self, message: M) -> Result<Ack> {
        self.request_within(message, self.ack_timeout).await
    }

    /// Like `request`, for messages whose acknowledgement trails real work
    /// and needs a longer budget than the relay default
    pub async fn request_within(&self, message: M, ack_timeout: Duration) -> Result<Ack> {
        let kind = message.kind();
        let (reply_tx, reply_rx) = oneshot::channel();

        let exchange = async {
            self.tx
                .send(Envelope {
                    message,
                    reply: reply_tx,
                })
                .await
                .map_err(|_| CaptureError::relay(kind, "receiving context is gone"))?;

            reply_rx
                .await
                .map_err(|_| CaptureError::relay(kind, "request dropped without acknowledgement"))
        };

        let result = match tokio::time::timeout(ack_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::relay(
                kind,
                format!("no acknowledgement within {:?}", ack_timeout),
            )),
        };

        match &result {
            Ok(ack) => debug!("{} acknowledged (ok={})", kind, ack.ok),
            Err(e) => error!("{}", e),
        }

        result
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Sender for fire-and-forget capture events, delivered in order
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<CaptureEvent>,
}

pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<CaptureEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx }, rx)
}

impl EventSender {
    /// Deliver an event. Returns false, after logging, if nobody listens.
    pub async fn send(&self, event: CaptureEvent) -> bool {
        let kind = event.kind();
        match self.tx.send(event).await {
            Ok(()) => true,
            Err(_) => {
                error!("{}", CaptureError::relay(kind, "background context is gone"));
                false
            }
        }
    }
}
