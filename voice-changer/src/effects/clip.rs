//! Soft clipping.
//!
//! `y = 32767 * (1/k) * c / (1 + 0.28 c^2)` with `c = k * s / 32767` and
//! `k = 1 + level / 6`. Level 0 gives a gentle knee, level 10 squashes full
//! scale to about a third.

use crate::dsp::helpers::to_sample;
use crate::settings::MAX_CLIP_LEVEL;

const FULL_SCALE: f32 = i16::MAX as f32;
const KNEE: f32 = 0.28;

/// Drive factor `k` for a clipping level (levels above 10 count as 10).
pub fn clip_factor(level: u8) -> f32 {
    1.0 + f32::from(level.min(MAX_CLIP_LEVEL)) / 6.0
}

/// Apply the soft clipping curve with drive `k` to every sample.
pub fn soft_clip(block: &mut [i16], k: f32) {
    let inv_k = 1.0 / k;
    for sample in block.iter_mut() {
        let c = f32::from(*sample) / FULL_SCALE * k;
        *sample = to_sample(FULL_SCALE * (inv_k * (c / (1.0 + KNEE * (c * c)))));
    }
}
