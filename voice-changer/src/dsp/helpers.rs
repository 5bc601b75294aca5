//! Block-level sample arithmetic shared by the effects.

/// Saturate an `i32` to `i16` range (`-32768..=32767`).
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    if val > i16::MAX as i32 {
        i16::MAX
    } else if val < i16::MIN as i32 {
        i16::MIN
    } else {
        val as i16
    }
}

/// Convert a filter output back to a sample, truncating toward zero.
///
/// Out-of-range values saturate, NaN maps to 0.
#[inline(always)]
pub fn to_sample(val: f32) -> i16 {
    val as i16
}

/// Multiply every sample by a positive integer gain, saturating.
pub fn block_boost(block: &mut [i16], gain: i32) {
    for sample in block.iter_mut() {
        *sample = saturate16(*sample as i32 * gain);
    }
}

/// Divide every sample by a positive integer, truncating toward zero.
pub fn block_attenuate(block: &mut [i16], divisor: i32) {
    debug_assert!(divisor > 0);
    for sample in block.iter_mut() {
        *sample = (*sample as i32 / divisor) as i16;
    }
}

/// Absolute sample value as `u16`, so `i16::MIN` does not overflow.
#[inline(always)]
pub fn magnitude(sample: i16) -> u16 {
    sample.unsigned_abs()
}
