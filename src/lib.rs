pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod offscreen;
pub mod recorder;
pub mod relay;
pub mod session;

pub use capture::{
    CaptureProvider, Encoder, MediaTrack, StreamSpecification, SyntheticConfig, SyntheticProvider,
    TrackDescriptor, TrackKind,
};
pub use config::Config;
pub use error::{CaptureError, Result};
pub use http::{create_router, AppState};
pub use offscreen::CaptureContext;
pub use recorder::{RecordedFile, Recorder, RecorderState};
pub use relay::{Ack, CaptureEvent, CaptureRequest, UiMessage, UiResponse};
pub use session::{
    BadgeIndicator, DownloadDirectory, RecordingConfig, SessionCoordinator, StartOutcome,
    StopOutcome,
};
