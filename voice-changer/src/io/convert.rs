//! Conversion of raw microphone words to the 16-bit working format.
//!
//! Microphones deliver one 32-bit word per sample. I2S and PDM devices put
//! the sample in the upper bits; the built-in ADC delivers an unsigned 12-bit
//! reading in the low bits. Amplifiers take the 16-bit samples as they are.

use super::device::DeviceKind;
use crate::dsp::helpers::saturate16;
use crate::settings::MAX_PREAMP_GAIN;

/// Midpoint of the 12-bit ADC range.
const ADC_MIDPOINT: i32 = 2048;

/// Convert raw microphone words to 16-bit samples.
///
/// Each word is shifted right by `17 - gain` and saturated. ADC readings are
/// first recentred around zero. Converts `min(raw.len(), out.len())` samples
/// and returns that count.
pub fn normalize_input(raw: &[i32], out: &mut [i16], kind: DeviceKind, gain: u8) -> usize {
    let shift = 17 - u32::from(gain.min(MAX_PREAMP_GAIN));
    let n = raw.len().min(out.len());
    for (dst, &word) in out[..n].iter_mut().zip(raw) {
        let word = match kind {
            DeviceKind::Adc => (word & 0xfff) - ADC_MIDPOINT,
            DeviceKind::I2s | DeviceKind::Pdm => word,
        };
        *dst = saturate16(word >> shift);
    }
    n
}
