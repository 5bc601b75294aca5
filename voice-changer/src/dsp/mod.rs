//! Filter design and sample arithmetic.
//!
//! - [`biquad`]: single second-order IIR section with bilinear designs
//! - [`cascade`]: Butterworth cascades, the Q table and the per-band bank
//! - [`helpers`]: saturation and block gain helpers

pub mod biquad;
pub mod cascade;
pub mod helpers;

pub use biquad::{Biquad, BiquadKind, Coefficients};
pub use cascade::{normalized_cutoff, FilterBank, FilterCascade, QTable};
