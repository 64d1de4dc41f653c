//! Capture context
//!
//! Owns every live stream and recorder. Reached only through the relay.

mod context;

pub use context::CaptureContext;
