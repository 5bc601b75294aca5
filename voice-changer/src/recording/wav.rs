//! Canonical 44-byte WAV header for mono 16-bit PCM.

use crate::constants::WAV_HEADER_LEN;
use crate::error::WavError;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Fields of a mono 16-bit PCM header that vary between recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    /// PCM payload size in bytes.
    pub data_size: u32,
}

impl WavHeader {
    pub fn new(sample_rate: u32, data_size: u32) -> Self {
        WavHeader { sample_rate, data_size }
    }

    /// Size of the whole file, header included.
    pub fn file_size(&self) -> u32 {
        WAV_HEADER_LEN as u32 + self.data_size
    }

    pub fn sample_count(&self) -> u32 {
        self.data_size / u32::from(BLOCK_ALIGN)
    }

    pub fn encode(&self) -> [u8; WAV_HEADER_LEN] {
        let mut out = [0u8; WAV_HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&(self.file_size() - 8).to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        out[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        let byte_rate = self.sample_rate * u32::from(BLOCK_ALIGN);
        out[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
        out[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Read a header back, accepting only mono 16-bit PCM.
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WavError::TooShort(bytes.len()));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" || &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(WavError::BadMagic);
        }
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        if u16_at(20) != PCM_FORMAT || u16_at(22) != CHANNELS || u16_at(34) != BITS_PER_SAMPLE {
            return Err(WavError::Unsupported);
        }
        Ok(WavHeader {
            sample_rate: u32_at(24),
            data_size: u32_at(40),
        })
    }
}
