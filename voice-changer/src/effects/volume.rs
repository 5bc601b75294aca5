//! Volume control.
//!
//! The control value runs 0..=15 with 6 as unity. It comes either from the
//! manual setting (0..=7, doubled) or from the top four bits of a 12-bit
//! potentiometer reading. It maps to a signed factor: 0 mutes, values above
//! 5 multiply by `value - 5`, values 1..=5 divide by `7 - value`.

use crate::dsp::helpers::{block_attenuate, block_boost};

/// Control value from the manual volume setting.
pub fn manual_level(volume: u8) -> u8 {
    volume.saturating_mul(2)
}

/// Control value from a 12-bit potentiometer reading.
pub fn pot_level(reading: u16) -> u8 {
    ((reading & 0x0fff) >> 8) as u8
}

/// Signed gain factor for a control value.
pub fn volume_factor(level: u8) -> i8 {
    let level = level.min(15) as i8;
    match level {
        0 => 0,
        l if l > 5 => l - 5,
        l => l - 7,
    }
}

/// Scale the block by `factor`: 0 mutes, negative divides, positive
/// multiplies with saturation.
pub fn apply_volume(block: &mut [i16], factor: i8) {
    match factor {
        0 => block.fill(0),
        1 => {}
        f if f < 0 => block_attenuate(block, -i32::from(f)),
        f => block_boost(block, i32::from(f)),
    }
}
