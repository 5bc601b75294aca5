//! Single-tap feedback echo.

use crate::constants::REVERB_SAMPLES;
use crate::dsp::helpers::saturate16;

/// 1600-sample feedback delay line.
///
/// `y = x + delay[tap] / (decay + 1)`, then `delay[tap] = y`. An impulse
/// therefore repeats every [`REVERB_SAMPLES`] samples, divided by
/// `decay + 1` each time.
#[derive(Clone)]
pub struct Reverb {
    delay: [i16; REVERB_SAMPLES],
    tap: usize,
}

impl Reverb {
    pub const fn new() -> Self {
        Reverb {
            delay: [0; REVERB_SAMPLES],
            tap: 0,
        }
    }

    pub fn process(&mut self, block: &mut [i16], decay_factor: u8) {
        let divisor = i32::from(decay_factor) + 1;
        for sample in block.iter_mut() {
            let echoed = saturate16(i32::from(*sample) + i32::from(self.delay[self.tap]) / divisor);
            *sample = echoed;
            self.delay[self.tap] = echoed;
            self.tap += 1;
            if self.tap == REVERB_SAMPLES {
                self.tap = 0;
            }
        }
    }

    /// Silence the delay line.
    pub fn reset(&mut self) {
        self.delay = [0; REVERB_SAMPLES];
        self.tap = 0;
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Reverb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reverb").field("tap", &self.tap).finish()
    }
}
