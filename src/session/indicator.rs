use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Visible recording indicator (toolbar icon, badge, tray light)
///
/// Written by the coordinator after every state change; never read back to
/// decide whether a session is active.
pub trait Indicator: Send + Sync {
    fn set_recording(&self, recording: bool);

    fn is_recording(&self) -> bool;
}

/// Badge that shows "REC" while a session is active
#[derive(Debug, Default)]
pub struct BadgeIndicator {
    recording: AtomicBool,
}

impl BadgeIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn badge_text(&self) -> &'static str {
        if self.is_recording() {
            "REC"
        } else {
            ""
        }
    }
}

impl Indicator for BadgeIndicator {
    fn set_recording(&self, recording: bool) {
        let previous = self.recording.swap(recording, Ordering::SeqCst);
        if previous != recording {
            info!(
                "Recording indicator {}",
                if recording { "on" } else { "off" }
            );
        }
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}
