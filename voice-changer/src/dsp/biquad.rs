//! Second-order IIR section (biquad).
//!
//! Coefficients come from the bilinear-transform designs popularised by
//! EarLevel Engineering. Processing uses the transposed direct form II, so
//! each section carries only two state values.
//!
//! Cutoffs are normalised: `Fc = frequency / sample_rate`, valid in `(0, 0.5]`.

use core::f32::consts::{PI, SQRT_2};

use libm::{powf, sqrtf, tanf};

/// Highest normalised frequency the tangent prewarp is evaluated at.
///
/// `tan(pi * 0.5)` is unbounded; stopping just short keeps every design's
/// poles strictly inside the unit circle when a caller clamps to Nyquist.
const MAX_DESIGN_FC: f32 = 0.4999;

/// Filter response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BiquadKind {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    Peak,
    LowShelf,
    HighShelf,
}

impl BiquadKind {
    /// Shelf and peak sections are parametric: one section, gain-driven.
    pub fn is_parametric(self) -> bool {
        matches!(self, BiquadKind::Peak | BiquadKind::LowShelf | BiquadKind::HighShelf)
    }

    /// Compute coefficients for this response.
    ///
    /// `k` is the prewarped frequency `tan(pi * Fc)`, `v` the linear peak gain.
    fn design(self, k: f32, q: f32, v: f32, boost: bool) -> Coefficients {
        let kk = k * k;
        match self {
            BiquadKind::LowPass => {
                let norm = 1.0 / (1.0 + k / q + kk);
                let a0 = kk * norm;
                Coefficients {
                    a0,
                    a1: 2.0 * a0,
                    a2: a0,
                    b1: 2.0 * (kk - 1.0) * norm,
                    b2: (1.0 - k / q + kk) * norm,
                }
            }
            BiquadKind::HighPass => {
                let norm = 1.0 / (1.0 + k / q + kk);
                Coefficients {
                    a0: norm,
                    a1: -2.0 * norm,
                    a2: norm,
                    b1: 2.0 * (kk - 1.0) * norm,
                    b2: (1.0 - k / q + kk) * norm,
                }
            }
            BiquadKind::BandPass => {
                let norm = 1.0 / (1.0 + k / q + kk);
                let a0 = k / q * norm;
                Coefficients {
                    a0,
                    a1: 0.0,
                    a2: -a0,
                    b1: 2.0 * (kk - 1.0) * norm,
                    b2: (1.0 - k / q + kk) * norm,
                }
            }
            BiquadKind::Notch => {
                let norm = 1.0 / (1.0 + k / q + kk);
                let a1 = 2.0 * (kk - 1.0) * norm;
                Coefficients {
                    a0: (1.0 + kk) * norm,
                    a1,
                    a2: (1.0 + kk) * norm,
                    b1: a1,
                    b2: (1.0 - k / q + kk) * norm,
                }
            }
            BiquadKind::Peak => {
                if boost {
                    let norm = 1.0 / (1.0 + 1.0 / q * k + kk);
                    let a1 = 2.0 * (kk - 1.0) * norm;
                    Coefficients {
                        a0: (1.0 + v / q * k + kk) * norm,
                        a1,
                        a2: (1.0 - v / q * k + kk) * norm,
                        b1: a1,
                        b2: (1.0 - 1.0 / q * k + kk) * norm,
                    }
                } else {
                    let norm = 1.0 / (1.0 + v / q * k + kk);
                    let a1 = 2.0 * (kk - 1.0) * norm;
                    Coefficients {
                        a0: (1.0 + 1.0 / q * k + kk) * norm,
                        a1,
                        a2: (1.0 - 1.0 / q * k + kk) * norm,
                        b1: a1,
                        b2: (1.0 - v / q * k + kk) * norm,
                    }
                }
            }
            BiquadKind::LowShelf => {
                let sv = sqrtf(2.0 * v);
                if boost {
                    let norm = 1.0 / (1.0 + SQRT_2 * k + kk);
                    Coefficients {
                        a0: (1.0 + sv * k + v * kk) * norm,
                        a1: 2.0 * (v * kk - 1.0) * norm,
                        a2: (1.0 - sv * k + v * kk) * norm,
                        b1: 2.0 * (kk - 1.0) * norm,
                        b2: (1.0 - SQRT_2 * k + kk) * norm,
                    }
                } else {
                    let norm = 1.0 / (1.0 + sv * k + v * kk);
                    Coefficients {
                        a0: (1.0 + SQRT_2 * k + kk) * norm,
                        a1: 2.0 * (kk - 1.0) * norm,
                        a2: (1.0 - SQRT_2 * k + kk) * norm,
                        b1: 2.0 * (v * kk - 1.0) * norm,
                        b2: (1.0 - sv * k + v * kk) * norm,
                    }
                }
            }
            BiquadKind::HighShelf => {
                let sv = sqrtf(2.0 * v);
                if boost {
                    let norm = 1.0 / (1.0 + SQRT_2 * k + kk);
                    Coefficients {
                        a0: (v + sv * k + kk) * norm,
                        a1: 2.0 * (kk - v) * norm,
                        a2: (v - sv * k + kk) * norm,
                        b1: 2.0 * (kk - 1.0) * norm,
                        b2: (1.0 - SQRT_2 * k + kk) * norm,
                    }
                } else {
                    let norm = 1.0 / (v + sv * k + kk);
                    Coefficients {
                        a0: (1.0 + SQRT_2 * k + kk) * norm,
                        a1: 2.0 * (kk - 1.0) * norm,
                        a2: (1.0 - SQRT_2 * k + kk) * norm,
                        b1: 2.0 * (kk - v) * norm,
                        b2: (v - sv * k + kk) * norm,
                    }
                }
            }
        }
    }
}

/// Feed-forward (`a*`) and feedback (`b*`) coefficients; `b0` is normalised to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
    pub b1: f32,
    pub b2: f32,
}

impl Coefficients {
    /// Pass-through section.
    pub const IDENTITY: Coefficients = Coefficients { a0: 1.0, a1: 0.0, a2: 0.0, b1: 0.0, b2: 0.0 };
}

/// One biquad section with its own state.
///
/// State is never shared: a section belongs to exactly one cascade in one
/// stream, and a configuration change builds fresh sections.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    kind: BiquadKind,
    fc: f32,
    q: f32,
    peak_gain_db: f32,
    coeffs: Coefficients,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// A pass-through low-pass section at Nyquist.
    pub const fn new() -> Self {
        Biquad {
            kind: BiquadKind::LowPass,
            fc: 0.5,
            q: 0.707,
            peak_gain_db: 0.0,
            coeffs: Coefficients::IDENTITY,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Create a configured section.
    pub fn with_params(kind: BiquadKind, fc: f32, q: f32, peak_gain_db: f32) -> Self {
        let mut biquad = Biquad::new();
        biquad.configure(kind, fc, q, peak_gain_db);
        biquad
    }

    /// Recompute the coefficients. State is kept, see [`reset`](Self::reset).
    ///
    /// `fc` must already be limited to `(0, 0.5]` by the caller.
    pub fn configure(&mut self, kind: BiquadKind, fc: f32, q: f32, peak_gain_db: f32) {
        self.kind = kind;
        self.fc = fc;
        self.q = q;
        self.peak_gain_db = peak_gain_db;

        let k = tanf(PI * fc.min(MAX_DESIGN_FC));
        let v = powf(10.0, peak_gain_db.abs() / 20.0);
        self.coeffs = kind.design(k, q, v, peak_gain_db >= 0.0);
    }

    /// Filter one sample.
    #[inline(always)]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let out = input * c.a0 + self.z1;
        self.z1 = input * c.a1 + self.z2 - c.b1 * out;
        self.z2 = input * c.a2 - c.b2 * out;
        out
    }

    /// Clear the two state values.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    pub fn kind(&self) -> BiquadKind {
        self.kind
    }

    /// Normalised cutoff as configured.
    pub fn cutoff(&self) -> f32 {
        self.fc
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn peak_gain_db(&self) -> f32 {
        self.peak_gain_db
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coeffs
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Biquad::new()
    }
}
