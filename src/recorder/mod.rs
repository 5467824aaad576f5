//! Recorder state machine and fragment buffer

mod buffer;
mod media_recorder;
mod state;

pub use buffer::ChunkBuffer;
pub use media_recorder::{Recorder, RecorderEvent};
pub use state::RecorderState;
