//! Pitch shift integration point.
//!
//! The phase vocoder itself lives outside this crate. The effect chain
//! initialises it whenever a plan with a new ratio is installed and then
//! hands it every block while the ratio differs from 1.0.

/// An external pitch shifter working in place on 16-bit blocks.
pub trait PitchShifter {
    /// Prepare for `ratio` with the given frame length, oversampling factor
    /// and sample rate.
    fn init(&mut self, ratio: f32, frame_len: usize, oversample: u32, sample_rate: u32);

    /// Shift one block in place.
    fn process(&mut self, block: &mut [i16]);
}

/// Pitch shifter for boards without one; leaves audio untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPitchShift;

impl PitchShifter for NoPitchShift {
    fn init(&mut self, _ratio: f32, _frame_len: usize, _oversample: u32, _sample_rate: u32) {}

    fn process(&mut self, _block: &mut [i16]) {}
}

impl<P: PitchShifter + ?Sized> PitchShifter for &mut P {
    fn init(&mut self, ratio: f32, frame_len: usize, oversample: u32, sample_rate: u32) {
        (**self).init(ratio, frame_len, oversample, sample_rate)
    }

    fn process(&mut self, block: &mut [i16]) {
        (**self).process(block)
    }
}
