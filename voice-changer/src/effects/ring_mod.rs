//! Ring modulation ("dalek voice").
//!
//! Each sample is multiplied by one period of a sine tone stored as `i8`
//! values scaled by the tone amplitude, then divided by that amplitude again.

use core::f32::consts::PI;

use libm::sinf;
use log::{info, warn};

use crate::constants::MAX_TONE_TABLE;
use crate::dsp::helpers::saturate16;

/// One period of the modulating tone.
#[derive(Clone)]
pub struct ToneTable {
    table: [i8; MAX_TONE_TABLE],
    len: usize,
    amplitude: u8,
}

impl ToneTable {
    /// Generate `sample_rate / freq_hz` points of `sin(2 pi f i / fs) * amplitude`.
    ///
    /// The amplitude is limited to `1..=127`. Periods longer than the table
    /// are truncated, with a warning.
    pub fn generate(freq_hz: u32, amplitude: u8, sample_rate: u32) -> Self {
        let amplitude = amplitude.clamp(1, i8::MAX as u8);
        let wanted = if freq_hz == 0 {
            usize::MAX
        } else {
            (sample_rate / freq_hz) as usize
        };
        let len = if wanted > MAX_TONE_TABLE {
            warn!("Tone of {freq_hz} Hz too low, period limited to {MAX_TONE_TABLE} points");
            MAX_TONE_TABLE
        } else {
            wanted.max(1)
        };

        let mut table = [0i8; MAX_TONE_TABLE];
        let step = 2.0 * PI * freq_hz as f32 / sample_rate.max(1) as f32;
        for (i, point) in table[..len].iter_mut().enumerate() {
            *point = (sinf(step * i as f32) * amplitude as f32) as i8;
        }
        info!("Generated {len} sine wave data points");
        ToneTable { table, len, amplitude }
    }

    pub fn points(&self) -> &[i8] {
        &self.table[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn amplitude(&self) -> u8 {
        self.amplitude
    }
}

impl core::fmt::Debug for ToneTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToneTable")
            .field("len", &self.len)
            .field("amplitude", &self.amplitude)
            .finish()
    }
}

/// Ring modulator state: the position within the tone period.
///
/// The phase is not restarted at each block: the next block continues where
/// the previous one stopped, so a period that does not divide the block
/// length stays continuous. Only [`reset`](Self::reset) returns it to the
/// start of the table.
#[derive(Debug, Clone, Default)]
pub struct RingModulator {
    phase: usize,
}

impl RingModulator {
    pub const fn new() -> Self {
        RingModulator { phase: 0 }
    }

    pub fn process(&mut self, block: &mut [i16], tone: &ToneTable) {
        let points = tone.points();
        let amplitude = i32::from(tone.amplitude());
        if self.phase >= points.len() {
            self.phase = 0;
        }
        for sample in block.iter_mut() {
            let product = i32::from(*sample) * i32::from(points[self.phase]);
            *sample = saturate16(product / amplitude);
            self.phase += 1;
            if self.phase == points.len() {
                self.phase = 0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_length_is_one_period() {
        let tone = ToneTable::generate(80, 127, 16_000);
        assert_eq!(tone.len(), 200);
        assert_eq!(tone.points()[0], 0);
        // Quarter period is the positive peak.
        assert!(tone.points()[50] >= 126);
        assert!(tone.points()[150] <= -126);
    }

    #[test]
    fn amplitude_and_length_are_limited() {
        let tone = ToneTable::generate(1, 0, 16_000);
        assert_eq!(tone.amplitude(), 1);
        assert_eq!(tone.len(), MAX_TONE_TABLE);
        let silent = ToneTable::generate(0, 50, 16_000);
        assert_eq!(silent.len(), MAX_TONE_TABLE);
        assert!(silent.points().iter().all(|&p| p == 0));
        let high = ToneTable::generate(20_000, 50, 16_000);
        assert_eq!(high.len(), 1);
    }

    #[test]
    fn modulation_scales_by_tone() {
        let tone = ToneTable::generate(4000, 100, 16_000);
        // Four points: 0, 100, 0, -100 (within rounding of the sine).
        assert_eq!(tone.len(), 4);
        let mut ring = RingModulator::new();
        let mut block = [1000i16; 8];
        ring.process(&mut block, &tone);
        for (i, &s) in block.iter().enumerate() {
            let expected = 1000 * i32::from(tone.points()[i % 4]) / 100;
            assert_eq!(i32::from(s), expected);
        }
        assert!(block[1] >= 990);
        assert!(block[3] <= -990);
        assert!(block[0].abs() < 10);
    }

    #[test]
    fn phase_continues_across_blocks() {
        let tone = ToneTable::generate(1000, 127, 16_000);
        let mut one = RingModulator::new();
        let mut whole = [5000i16; 40];
        one.process(&mut whole, &tone);

        let mut split = RingModulator::new();
        let mut first = [5000i16; 13];
        let mut second = [5000i16; 27];
        split.process(&mut first, &tone);
        split.process(&mut second, &tone);

        assert_eq!(&whole[..13], &first[..]);
        assert_eq!(&whole[13..], &second[..]);
    }

    #[test]
    fn next_block_does_not_restart_the_period() {
        use crate::constants::BLOCK_SAMPLES;
        // 200-point period against 1024-sample blocks.
        let tone = ToneTable::generate(80, 127, 16_000);
        let mut ring = RingModulator::new();
        let mut block = [1000i16; BLOCK_SAMPLES];
        ring.process(&mut block, &tone);

        let mut next = [1000i16; 4];
        ring.process(&mut next, &tone);
        let offset = BLOCK_SAMPLES % tone.len();
        for (i, &s) in next.iter().enumerate() {
            let expected = 1000 * i32::from(tone.points()[offset + i]) / 127;
            assert_eq!(i32::from(s), expected);
        }
        assert_ne!(next[1], 1000 * i16::from(tone.points()[1]) / 127);

        ring.reset();
        let mut restarted = [1000i16; 2];
        ring.process(&mut restarted, &tone);
        assert_eq!(restarted[1], 1000 * i16::from(tone.points()[1]) / 127);
    }
}
