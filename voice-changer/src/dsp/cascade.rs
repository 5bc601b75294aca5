//! Cascaded biquad filters.
//!
//! A single biquad rolls off at 12 dB/octave. Chaining `n` low-pass or
//! high-pass sections with the pole Q factors of an order-`2n` Butterworth
//! filter gives a maximally flat response with a steeper skirt. The Q factors
//! for every order are precomputed once into [`QTable`].
//!
//! [`FilterBank`] holds one cascade per configurable band and runs them in a
//! fixed order.

use core::f32::consts::{FRAC_1_SQRT_2, PI};

use libm::cosf;
use log::warn;

use super::biquad::{Biquad, BiquadKind};
use super::helpers::to_sample;
use crate::constants::{MAX_CASCADE_ORDER, Q_TABLE_LEN};
use crate::settings::{Band, BandSettings, EffectSettings};

/// Butterworth pole Q factors for cascade orders `1..=MAX_CASCADE_ORDER`.
///
/// Order `c` occupies `c` consecutive entries starting at the triangular
/// offset `c * (c - 1) / 2`.
#[derive(Debug, Clone)]
pub struct QTable {
    values: [f32; Q_TABLE_LEN],
}

impl QTable {
    /// Compute every entry: `Q(c, i) = 1 / (2 cos((2i + 1) pi / 4c))`.
    pub fn compute() -> Self {
        let mut values = [0.0f32; Q_TABLE_LEN];
        let mut idx = 0;
        for order in 1..=MAX_CASCADE_ORDER {
            for i in 0..order {
                let angle = (1 + 2 * i) as f32 * PI / (4 * order) as f32;
                values[idx] = 1.0 / (2.0 * cosf(angle));
                idx += 1;
            }
        }
        QTable { values }
    }

    /// Index of the first entry for `order`.
    pub const fn offset(order: usize) -> usize {
        order * (order - 1) / 2
    }

    /// Q factors for a cascade of `order` sections.
    ///
    /// # Panics
    ///
    /// If `order` is 0 or above [`MAX_CASCADE_ORDER`].
    pub fn for_order(&self, order: usize) -> &[f32] {
        assert!((1..=MAX_CASCADE_ORDER).contains(&order), "cascade order {order} out of range");
        let start = Self::offset(order);
        &self.values[start..start + order]
    }

    /// The whole flat table.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Normalise a frequency to the sample rate, clamping at Nyquist.
///
/// Above Nyquist the result is exactly `0.5` and a warning is logged; the
/// filter is still built.
pub fn normalized_cutoff(freq_hz: f32, sample_rate: u32) -> f32 {
    let fc = freq_hz / sample_rate as f32;
    if fc > 0.5 {
        warn!("Cutoff frequency {freq_hz} Hz reduced as too high for {sample_rate} Hz");
        0.5
    } else {
        fc
    }
}

/// Up to [`MAX_CASCADE_ORDER`] biquad sections run in series.
#[derive(Debug, Clone, Copy)]
pub struct FilterCascade {
    stages: [Biquad; MAX_CASCADE_ORDER],
    len: usize,
}

impl FilterCascade {
    /// A cascade with no sections (passes audio untouched).
    pub const fn empty() -> Self {
        FilterCascade {
            stages: [Biquad::new(); MAX_CASCADE_ORDER],
            len: 0,
        }
    }

    /// Design a cascade.
    ///
    /// With `order == 1` the caller's `q` is used. Higher orders take their
    /// per-section Q from `table` and ignore `q`. Shelf and peak kinds are
    /// always a single section. Out-of-range orders and invalid Q values are
    /// corrected with a warning.
    pub fn build(
        kind: BiquadKind,
        freq_hz: f32,
        q: f32,
        gain_db: f32,
        order: usize,
        sample_rate: u32,
        table: &QTable,
    ) -> Self {
        let fc = normalized_cutoff(freq_hz, sample_rate);

        let order = if kind.is_parametric() {
            1
        } else if order == 0 {
            warn!("Cascade order 0 for {kind:?}, using 1");
            1
        } else if order > MAX_CASCADE_ORDER {
            warn!("Cascade order {order} for {kind:?} limited to {MAX_CASCADE_ORDER}");
            MAX_CASCADE_ORDER
        } else {
            order
        };

        let q = if q.is_finite() && q > 0.0 {
            q
        } else {
            warn!("Invalid Q {q} for {kind:?}, using {FRAC_1_SQRT_2}");
            FRAC_1_SQRT_2
        };

        let mut cascade = FilterCascade::empty();
        if order == 1 {
            cascade.stages[0] = Biquad::with_params(kind, fc, q, gain_db);
        } else {
            for (stage, &section_q) in cascade.stages.iter_mut().zip(table.for_order(order)) {
                *stage = Biquad::with_params(kind, fc, section_q, gain_db);
            }
        }
        cascade.len = order;
        cascade
    }

    /// Build the cascade for one configured band, or an empty one if the
    /// band is disabled.
    pub fn for_band(band: Band, settings: &BandSettings, sample_rate: u32, table: &QTable) -> Self {
        if !settings.enabled {
            return FilterCascade::empty();
        }
        FilterCascade::build(
            band.kind(),
            settings.freq_hz,
            settings.q,
            settings.gain_db,
            settings.order as usize,
            sample_rate,
            table,
        )
    }

    /// Active sections, in processing order.
    pub fn stages(&self) -> &[Biquad] {
        &self.stages[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Filter one sample through every section without quantising.
    pub fn process(&mut self, input: f32) -> f32 {
        self.stages[..self.len].iter_mut().fold(input, |x, stage| stage.process(x))
    }

    /// Filter a block in place.
    ///
    /// Each section processes the whole block before the next one starts and
    /// its output is truncated back to 16 bits in between.
    pub fn process_block(&mut self, block: &mut [i16]) {
        for stage in self.stages[..self.len].iter_mut() {
            for sample in block.iter_mut() {
                *sample = to_sample(stage.process(*sample as f32));
            }
        }
    }

    /// Clear the state of every section.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

/// One cascade per band, applied in [`Band::ALL`] order.
#[derive(Debug, Clone)]
pub struct FilterBank {
    cascades: [FilterCascade; Band::COUNT],
}

impl FilterBank {
    /// A bank with every band disabled.
    pub const fn empty() -> Self {
        FilterBank {
            cascades: [FilterCascade::empty(); Band::COUNT],
        }
    }

    /// Build cascades for all enabled bands.
    pub fn build(settings: &EffectSettings, table: &QTable) -> Self {
        let mut bank = FilterBank::empty();
        for band in Band::ALL {
            bank.rebuild_band(band, settings, table);
        }
        bank
    }

    /// Rebuild the cascade of a single band.
    pub fn rebuild_band(&mut self, band: Band, settings: &EffectSettings, table: &QTable) {
        self.cascades[band.index()] =
            FilterCascade::for_band(band, settings.band(band), settings.sample_rate, table);
    }

    pub fn cascade(&self, band: Band) -> &FilterCascade {
        &self.cascades[band.index()]
    }

    /// Total number of active sections across all bands.
    pub fn stage_count(&self) -> usize {
        self.cascades.iter().map(FilterCascade::len).sum()
    }

    /// Run every active cascade over the block, in band order.
    pub fn process_block(&mut self, block: &mut [i16]) {
        for cascade in self.cascades.iter_mut().filter(|c| !c.is_empty()) {
            cascade.process_block(block);
        }
    }

    pub fn reset(&mut self) {
        for cascade in self.cascades.iter_mut() {
            cascade.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLOCK_SAMPLES;

    fn rms(samples: &[i16]) -> f32 {
        let sum: f32 = samples.iter().map(|&s| (s as f32) * (s as f32)).sum();
        libm::sqrtf(sum / samples.len() as f32)
    }

    #[test]
    fn q_table_offsets_and_lengths() {
        let table = QTable::compute();
        assert_eq!(table.as_slice().len(), 36);
        for order in 1..=MAX_CASCADE_ORDER {
            assert_eq!(QTable::offset(order), order * (order - 1) / 2);
            assert_eq!(table.for_order(order).len(), order);
        }
        assert_eq!(QTable::offset(8) + 8, Q_TABLE_LEN);
    }

    #[test]
    fn q_table_values() {
        let table = QTable::compute();
        assert!((table.for_order(1)[0] - 0.70711).abs() < 1e-4);
        let second = table.for_order(2);
        assert!((second[0] - 0.54120).abs() < 1e-4);
        assert!((second[1] - 1.30656).abs() < 1e-4);
        // Within each order the Q factors rise monotonically.
        for order in 2..=MAX_CASCADE_ORDER {
            let qs = table.for_order(order);
            assert!(qs.windows(2).all(|w| w[0] < w[1]), "order {order}: {qs:?}");
        }
    }

    #[test]
    fn cutoff_above_nyquist_clamps_to_half() {
        assert_eq!(normalized_cutoff(9000.0, 16_000), 0.5);
        assert_eq!(normalized_cutoff(40_000.0, 16_000), 0.5);
        assert_eq!(normalized_cutoff(8000.0, 16_000), 0.5);
        assert_eq!(normalized_cutoff(4000.0, 16_000), 0.25);
    }

    #[test]
    fn clamped_cascade_is_bounded() {
        let table = QTable::compute();
        for order in 1..=MAX_CASCADE_ORDER {
            let mut cascade =
                FilterCascade::build(BiquadKind::LowPass, 12_000.0, 0.707, 0.0, order, 16_000, &table);
            assert!(cascade.stages().iter().all(|s| s.cutoff() == 0.5));

            // Deterministic pseudo-random input in [-1, 1].
            let mut seed = 0x1234_5678u32;
            for i in 0..20_000 {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let x = if i % 3 == 0 {
                    if i % 2 == 0 { 1.0 } else { -1.0 }
                } else {
                    (seed >> 8) as f32 / (1u32 << 23) as f32 - 1.0
                };
                let y = cascade.process(x);
                assert!(y.is_finite() && y.abs() < 100.0, "order {order} diverged: {y}");
            }
        }
    }

    #[test]
    fn single_section_uses_requested_q() {
        let table = QTable::compute();
        let cascade = FilterCascade::build(BiquadKind::HighPass, 1000.0, 2.5, 0.0, 1, 16_000, &table);
        assert_eq!(cascade.len(), 1);
        assert_eq!(cascade.stages()[0].q(), 2.5);
    }

    #[test]
    fn multi_section_uses_table_q() {
        let table = QTable::compute();
        let cascade = FilterCascade::build(BiquadKind::LowPass, 1000.0, 2.5, 0.0, 3, 16_000, &table);
        assert_eq!(cascade.len(), 3);
        for (stage, &q) in cascade.stages().iter().zip(table.for_order(3)) {
            assert_eq!(stage.q(), q);
            assert_eq!(stage.kind(), BiquadKind::LowPass);
        }
    }

    #[test]
    fn parametric_kinds_are_single_section() {
        let table = QTable::compute();
        for kind in [BiquadKind::Peak, BiquadKind::LowShelf, BiquadKind::HighShelf] {
            let cascade = FilterCascade::build(kind, 1000.0, 1.0, 3.0, 4, 16_000, &table);
            assert_eq!(cascade.len(), 1, "{kind:?}");
        }
    }

    #[test]
    fn order_and_q_are_corrected() {
        let table = QTable::compute();
        let zero = FilterCascade::build(BiquadKind::LowPass, 1000.0, 0.7, 0.0, 0, 16_000, &table);
        assert_eq!(zero.len(), 1);
        let huge = FilterCascade::build(BiquadKind::LowPass, 1000.0, 0.7, 0.0, 20, 16_000, &table);
        assert_eq!(huge.len(), MAX_CASCADE_ORDER);
        let bad_q = FilterCascade::build(BiquadKind::LowPass, 1000.0, 0.0, 0.0, 1, 16_000, &table);
        assert!((bad_q.stages()[0].q() - FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn lowpass_attenuates_1khz_as_predicted() {
        // 1 kHz through a 500 Hz low-pass at 16 kHz. With bilinear prewarping
        // the response is that of the analog prototype at
        // W = tan(pi f / fs) / tan(pi fc / fs).
        let table = QTable::compute();
        let sample_rate = 16_000u32;
        let q = 0.707f32;
        let mut cascade = FilterCascade::build(BiquadKind::LowPass, 500.0, q, 0.0, 1, sample_rate, &table);

        let amplitude = 10_000.0f32;
        let mut output = [0i16; BLOCK_SAMPLES];
        let mut input = [0i16; BLOCK_SAMPLES];
        for block in 0..4 {
            for (i, s) in input.iter_mut().enumerate() {
                let n = (block * BLOCK_SAMPLES + i) as f32;
                *s = (amplitude * libm::sinf(2.0 * PI * 1000.0 * n / sample_rate as f32)) as i16;
            }
            output = input;
            cascade.process_block(&mut output);
        }

        let w = libm::tanf(PI * 1000.0 / 16_000.0) / libm::tanf(PI * 500.0 / 16_000.0);
        let expected =
            1.0 / libm::sqrtf((1.0 - w * w) * (1.0 - w * w) + (w / q) * (w / q));
        let tail = BLOCK_SAMPLES / 2;
        let measured = rms(&output[tail..]) / rms(&input[tail..]);
        assert!(measured < 0.5, "not attenuated: {measured}");
        assert!(
            (measured - expected).abs() < expected * 0.03,
            "measured {measured}, expected {expected}"
        );
    }

    #[test]
    fn bank_runs_enabled_bands_only() {
        let table = QTable::compute();
        let mut settings = EffectSettings::default();
        let empty = FilterBank::build(&settings, &table);
        assert_eq!(empty.stage_count(), 0);

        settings.low_pass.enabled = true;
        settings.low_pass.order = 3;
        settings.peak.enabled = true;
        settings.peak.order = 5;
        let bank = FilterBank::build(&settings, &table);
        assert_eq!(bank.cascade(Band::LowPass).len(), 3);
        assert_eq!(bank.cascade(Band::Peak).len(), 1);
        assert!(bank.cascade(Band::HighPass).is_empty());
        assert_eq!(bank.stage_count(), 4);
    }

    #[test]
    fn empty_bank_leaves_block_untouched() {
        let table = QTable::compute();
        let mut bank = FilterBank::build(&EffectSettings::default(), &table);
        let mut block = [1234i16; 64];
        bank.process_block(&mut block);
        assert!(block.iter().all(|&s| s == 1234));
    }
}
