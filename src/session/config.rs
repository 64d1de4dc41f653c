use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for recording sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Where finished files are written (`~` is expanded)
    /// Default: ~/Downloads/capture-relay
    pub downloads_path: String,

    /// Wait before encoding when the provider has no readiness signal
    /// Default: 200ms
    pub settle_delay_ms: u64,

    /// How long a relay request may go unacknowledged
    pub relay_timeout_ms: u64,

    /// How long a stop waits for SESSION_COMPLETE after STOP_ALL was acknowledged
    pub completion_timeout_ms: u64,

    /// How long closing the capture context may take before it is aborted
    pub close_timeout_ms: u64,

    /// Requests the capture context can have queued
    pub relay_capacity: usize,

    /// SAVE_FILE / SESSION_COMPLETE events the background can have queued
    pub event_capacity: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            downloads_path: "~/Downloads/capture-relay".to_string(),
            settle_delay_ms: 200,
            relay_timeout_ms: 5000,
            completion_timeout_ms: 10000,
            close_timeout_ms: 2000,
            relay_capacity: 32,
            event_capacity: 100,
        }
    }
}

impl RecordingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    /// STOP_ALL is acknowledged only after every recorder flushed, so it
    /// gets the completion budget rather than the plain relay timeout
    pub fn stop_timeout(&self) -> Duration {
        self.relay_timeout().max(self.completion_timeout())
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Request queue size; a zero-sized channel cannot be created
    pub fn relay_queue_capacity(&self) -> usize {
        self.relay_capacity.max(1)
    }

    pub fn event_queue_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacities_are_clamped() {
        let config = RecordingConfig {
            relay_capacity: 0,
            event_capacity: 0,
            ..RecordingConfig::default()
        };
        assert_eq!(config.relay_queue_capacity(), 1);
        assert_eq!(config.event_queue_capacity(), 1);
    }

    #[test]
    fn test_stop_timeout_covers_completion() {
        let config = RecordingConfig {
            relay_timeout_ms: 200,
            completion_timeout_ms: 3000,
            ..RecordingConfig::default()
        };
        assert_eq!(config.stop_timeout(), Duration::from_millis(3000));
    }
}
