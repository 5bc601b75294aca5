//! Streaming a recording out as a WAV file.
//!
//! The header goes out first, then the PCM in chunks of one block. In
//! [`ExportMode::Processed`] every block is run through an effect chain on
//! the way, so a raw recording can be downloaded with the current effects.

use log::info;

use super::buffer::RecordingBuffer;
use crate::constants::{BLOCK_BYTES, BLOCK_SAMPLES, WAV_HEADER_LEN};
use crate::effects::{EffectChain, PitchShifter};
use crate::error::ExportError;

/// How the PCM payload is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportMode {
    /// Samples as recorded.
    Raw,
    /// Samples re-run through the effect chain.
    #[default]
    Processed,
}

/// Receiver of the exported byte stream (an HTTP response, a file, ...).
pub trait ChunkSink {
    type Error;

    /// Declared before any chunk is sent.
    fn begin(&mut self, _total_bytes: usize) -> Result<(), Self::Error> {
        Ok(())
    }

    fn send(&mut self, chunk: &[u8]) -> Result<(), Self::Error>;
}

/// Export the recording in `buffer` to `sink`.
///
/// For processed exports the chain state is cleared first and the volume is
/// taken from the manual setting. Returns the number of bytes sent.
pub fn export_wav<S, P>(
    buffer: Option<&mut RecordingBuffer<'_>>,
    mode: ExportMode,
    chain: &mut EffectChain<P>,
    sink: &mut S,
) -> Result<usize, ExportError<S::Error>>
where
    S: ChunkSink,
    P: PitchShifter,
{
    let buffer = buffer.ok_or(ExportError::NoRecording)?;
    let total = buffer.build_wav_header();
    sink.begin(total).map_err(ExportError::Sink)?;

    let header = buffer.header().encode();
    sink.send(&header).map_err(ExportError::Sink)?;

    match mode {
        ExportMode::Raw => {
            for chunk in buffer.pcm_bytes().chunks(BLOCK_BYTES) {
                sink.send(chunk).map_err(ExportError::Sink)?;
            }
        }
        ExportMode::Processed => {
            chain.reset_state();
            let volume = chain.volume_factor(None);
            let mut cursor = buffer.cursor();
            let mut samples = [0i16; BLOCK_SAMPLES];
            let mut bytes = [0u8; BLOCK_BYTES];
            loop {
                let n = buffer.read_block(&mut cursor, &mut samples);
                if n == 0 {
                    break;
                }
                chain.apply(&mut samples[..n], volume);
                for (dst, s) in bytes.chunks_exact_mut(2).zip(&samples[..n]) {
                    dst.copy_from_slice(&s.to_le_bytes());
                }
                sink.send(&bytes[..n * 2]).map_err(ExportError::Sink)?;
            }
        }
    }

    info!("Downloaded recording, size: {} bytes ({} samples)", total, (total - WAV_HEADER_LEN) / 2);
    Ok(total)
}
