//! Capture provider abstractions
//!
//! Everything that touches devices lives behind `CaptureProvider`: track
//! acquisition, stream readiness, and the encoder producing file chunks.

pub mod permissions;
pub mod provider;
pub mod stream;
pub mod synthetic;

pub use permissions::{check_permissions, PermissionStatus};
pub use provider::{
    container_extension, select_mime_type, CaptureProvider, DeviceInfo, DeviceKind, Encoder,
    MediaTrack, Readiness,
};
pub use stream::{
    output_filename, output_filename_at, MediaStream, StreamSpecification, TrackDescriptor,
    TrackKind,
};
pub use synthetic::{SyntheticConfig, SyntheticProvider};
