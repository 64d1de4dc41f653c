pub mod buffer;
pub mod handle;
pub mod recorder;
pub mod state;

pub use buffer::ChunkBuffer;
pub use handle::{RecorderHandle, RecorderOutcome};
pub use recorder::{RecordedFile, Recorder};
pub use state::RecorderState;
