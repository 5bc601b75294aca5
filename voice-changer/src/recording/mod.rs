//! Recording storage and WAV export.
//!
//! - [`RecordingBuffer`]: header reservation + PCM over a borrowed region
//! - [`WavHeader`]: the 44-byte mono 16-bit PCM header
//! - [`export_wav`]: chunked download, raw or re-processed

pub mod buffer;
pub mod export;
pub mod wav;

pub use buffer::{PlaybackCursor, RecordingBuffer};
pub use export::{export_wav, ChunkSink, ExportMode};
pub use wav::WavHeader;
