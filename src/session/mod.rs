//! Recording session management (background context)
//!
//! This module provides the `SessionCoordinator` that manages:
//! - The single active/inactive recording session
//! - Creation and teardown of the capture context
//! - Forwarding stream specifications over the relay
//! - Persisting finished files to the downloads folder
//! - The visible recording indicator

mod config;
mod coordinator;
mod downloads;
mod host;
mod indicator;
mod state;

pub use config::RecordingConfig;
pub use coordinator::{SavedFile, SessionCoordinator, StartOutcome, StopOutcome, StreamOutcome};
pub use downloads::{DownloadDirectory, DownloadSink};
pub use host::CaptureHost;
pub use indicator::{BadgeIndicator, Indicator};
pub use state::{Session, SessionSnapshot};
