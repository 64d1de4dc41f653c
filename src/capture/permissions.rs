use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::provider::CaptureProvider;
use super::stream::{TrackDescriptor, TrackKind};

/// Whether microphone and camera access is currently granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub audio: bool,
    pub video: bool,
}

impl PermissionStatus {
    pub fn all_granted(&self) -> bool {
        self.audio && self.video
    }
}

/// Probe access by acquiring one track of each kind and releasing it at once
pub async fn check_permissions(provider: &dyn CaptureProvider) -> PermissionStatus {
    let status = PermissionStatus {
        audio: probe(provider, TrackDescriptor::audio()).await,
        video: probe(provider, TrackDescriptor::video()).await,
    };

    info!(
        "Permission check via {}: audio={}, video={}",
        provider.name(),
        status.audio,
        status.video
    );

    status
}

async fn probe(provider: &dyn CaptureProvider, descriptor: TrackDescriptor) -> bool {
    let kind: TrackKind = descriptor.kind;
    match provider.acquire(&descriptor).await {
        Ok(mut track) => {
            track.stop();
            true
        }
        Err(e) => {
            warn!("{} access unavailable: {}", kind, e);
            false
        }
    }
}
