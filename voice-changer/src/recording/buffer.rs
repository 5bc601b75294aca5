//! The recording region.
//!
//! One caller-provided byte region (typically external PSRAM) laid out as a
//! WAV file: a 44-byte header reservation followed by little-endian 16-bit
//! PCM. The header is only filled in when the recording is exported.
//!
//! ```text
//! | header (44) | sample 0 | sample 1 | ... | sample n-1 | unused ... |
//!               ^                                         ^
//!               WAV_HEADER_LEN                            end
//! ```

use log::warn;

use super::wav::WavHeader;
use crate::constants::WAV_HEADER_LEN;
use crate::error::CapacityExceeded;

/// Recording storage over a borrowed byte region.
pub struct RecordingBuffer<'a> {
    region: &'a mut [u8],
    /// Byte offset one past the last recorded sample.
    end: usize,
    sample_rate: u32,
}

/// Read position for playing back a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    pos: usize,
}

impl PlaybackCursor {
    /// Samples already read.
    pub fn samples_read(&self) -> usize {
        (self.pos - WAV_HEADER_LEN) / 2
    }
}

impl<'a> RecordingBuffer<'a> {
    /// Wrap `region`. Returns `None` if it cannot hold the header and at
    /// least one sample.
    pub fn new(region: &'a mut [u8], sample_rate: u32) -> Option<Self> {
        if region.len() < WAV_HEADER_LEN + 2 {
            warn!("Recording region of {} bytes is too small", region.len());
            return None;
        }
        Some(RecordingBuffer {
            region,
            end: WAV_HEADER_LEN,
            sample_rate,
        })
    }

    /// Discard the current recording and start a new one at `sample_rate`.
    pub fn rewind(&mut self, sample_rate: u32) {
        self.end = WAV_HEADER_LEN;
        self.sample_rate = sample_rate;
    }

    /// Number of samples the region can hold.
    pub fn capacity(&self) -> usize {
        (self.region.len() - WAV_HEADER_LEN) / 2
    }

    pub fn sample_count(&self) -> usize {
        (self.end - WAV_HEADER_LEN) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.end == WAV_HEADER_LEN
    }

    pub fn is_full(&self) -> bool {
        self.sample_count() == self.capacity()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append samples at the write position.
    ///
    /// If they do not all fit, the ones that do are stored and the count is
    /// reported in the error.
    pub fn record_block(&mut self, samples: &[i16]) -> Result<(), CapacityExceeded> {
        let room = self.capacity() - self.sample_count();
        let stored = samples.len().min(room);
        let dst = &mut self.region[self.end..self.end + stored * 2];
        for (bytes, sample) in dst.chunks_exact_mut(2).zip(samples) {
            bytes.copy_from_slice(&sample.to_le_bytes());
        }
        self.end += stored * 2;
        if stored < samples.len() {
            Err(CapacityExceeded { stored })
        } else {
            Ok(())
        }
    }

    /// Cursor at the first recorded sample.
    pub fn cursor(&self) -> PlaybackCursor {
        PlaybackCursor { pos: WAV_HEADER_LEN }
    }

    /// Copy the next samples into `out` and advance the cursor.
    ///
    /// Returns the number of samples copied; 0 once the end of the recording
    /// is reached.
    pub fn read_block(&self, cursor: &mut PlaybackCursor, out: &mut [i16]) -> usize {
        let pos = cursor.pos.clamp(WAV_HEADER_LEN, self.end);
        let n = ((self.end - pos) / 2).min(out.len());
        let src = &self.region[pos..pos + n * 2];
        for (sample, bytes) in out.iter_mut().zip(src.chunks_exact(2)) {
            *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        }
        cursor.pos = pos + n * 2;
        n
    }

    /// Header describing the current recording.
    pub fn header(&self) -> WavHeader {
        WavHeader::new(self.sample_rate, (self.end - WAV_HEADER_LEN) as u32)
    }

    /// Write the header into the reserved prefix and return the total file
    /// size in bytes. Calling it again without recording gives the same bytes.
    pub fn build_wav_header(&mut self) -> usize {
        let header = self.header().encode();
        self.region[..WAV_HEADER_LEN].copy_from_slice(&header);
        self.end
    }

    /// The complete WAV file: header plus recorded samples.
    pub fn wav_bytes(&mut self) -> &[u8] {
        let len = self.build_wav_header();
        &self.region[..len]
    }

    /// Recorded PCM bytes, without the header.
    pub fn pcm_bytes(&self) -> &[u8] {
        &self.region[WAV_HEADER_LEN..self.end]
    }
}

impl core::fmt::Debug for RecordingBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecordingBuffer")
            .field("capacity", &self.capacity())
            .field("samples", &self.sample_count())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_small_region_rejected() {
        let mut tiny = [0u8; WAV_HEADER_LEN + 1];
        assert!(RecordingBuffer::new(&mut tiny, 16_000).is_none());
        let mut ok = [0u8; WAV_HEADER_LEN + 2];
        assert_eq!(RecordingBuffer::new(&mut ok, 16_000).unwrap().capacity(), 1);
    }

    #[test]
    fn record_then_read_back_in_blocks() {
        let mut region = vec![0u8; WAV_HEADER_LEN + 2 * 100];
        let mut buf = RecordingBuffer::new(&mut region, 16_000).unwrap();
        let samples: Vec<i16> = (0..70).map(|i| i * 300 - 10_000).collect();
        buf.record_block(&samples[..40]).unwrap();
        buf.record_block(&samples[40..]).unwrap();
        assert_eq!(buf.sample_count(), 70);

        let mut cursor = buf.cursor();
        let mut out = [0i16; 32];
        let mut read = Vec::new();
        loop {
            let n = buf.read_block(&mut cursor, &mut out);
            if n == 0 {
                break;
            }
            read.extend_from_slice(&out[..n]);
        }
        assert_eq!(read, samples);
        assert_eq!(cursor.samples_read(), 70);
        // Stays at the end.
        assert_eq!(buf.read_block(&mut cursor, &mut out), 0);
    }

    #[test]
    fn capacity_exceeded_keeps_what_fits() {
        let mut region = vec![0u8; WAV_HEADER_LEN + 2 * 10];
        let mut buf = RecordingBuffer::new(&mut region, 16_000).unwrap();
        buf.record_block(&[1; 6]).unwrap();
        assert_eq!(buf.record_block(&[2; 6]), Err(CapacityExceeded { stored: 4 }));
        assert!(buf.is_full());
        assert_eq!(buf.record_block(&[3; 1]), Err(CapacityExceeded { stored: 0 }));
        assert_eq!(buf.sample_count(), 10);
        assert!(buf.record_block(&[]).is_ok());
    }

    #[test]
    fn header_is_idempotent() {
        let mut region = vec![0u8; WAV_HEADER_LEN + 2 * 16];
        let mut buf = RecordingBuffer::new(&mut region, 16_000).unwrap();
        buf.record_block(&[7; 5]).unwrap();
        assert_eq!(buf.build_wav_header(), WAV_HEADER_LEN + 10);
        let first = buf.wav_bytes().to_vec();
        let second = buf.wav_bytes().to_vec();
        assert_eq!(first, second);
        assert_eq!(WavHeader::parse(&first).unwrap(), WavHeader::new(16_000, 10));
        assert_eq!(&first[WAV_HEADER_LEN..WAV_HEADER_LEN + 2], &7i16.to_le_bytes());
    }

    #[test]
    fn rewind_starts_fresh() {
        let mut region = vec![0u8; WAV_HEADER_LEN + 2 * 16];
        let mut buf = RecordingBuffer::new(&mut region, 16_000).unwrap();
        buf.record_block(&[7; 5]).unwrap();
        buf.rewind(8_000);
        assert!(buf.is_empty());
        assert_eq!(buf.header(), WavHeader::new(8_000, 0));
        let mut cursor = buf.cursor();
        assert_eq!(buf.read_block(&mut cursor, &mut [0i16; 4]), 0);
        assert!(buf.pcm_bytes().is_empty());
    }
}
