//! The effect chain.
//!
//! Each block goes through the enabled steps in a fixed order:
//!
//! | Step | Skipped by bypass | Module |
//! |------|-------------------|--------|
//! | Filter cascades (BP, HP, LP, HS, LS, peak) | yes | [`crate::dsp`] |
//! | Ring modulation | yes | [`ring_mod`] |
//! | Reverb | yes | [`reverb`] |
//! | Volume | no | [`volume`] |
//! | Pitch shift | no | [`pitch`] |
//! | Soft clipping | yes | [`clip`] |
//!
//! Configuration arrives as a whole [`EffectPlan`]; see [`plan`].

pub mod clip;
pub mod pitch;
pub mod plan;
pub mod reverb;
pub mod ring_mod;
pub mod volume;

pub use pitch::{NoPitchShift, PitchShifter};
pub use plan::{Configurator, EffectPlan, PlanSlot};
pub use reverb::Reverb;
pub use ring_mod::{RingModulator, ToneTable};

use log::info;

use crate::constants::{BLOCK_SAMPLES, PITCH_OVERSAMPLE};

/// Runs an [`EffectPlan`] over sample blocks, keeping the effect state that
/// has to survive from one block to the next.
pub struct EffectChain<P> {
    plan: EffectPlan,
    ring: RingModulator,
    reverb: Reverb,
    pitch: P,
    /// Ratio and rate the pitch shifter was last initialised for.
    pitch_setup: Option<(f32, u32)>,
}

impl<P: PitchShifter> EffectChain<P> {
    pub fn new(plan: EffectPlan, pitch: P) -> Self {
        let mut chain = EffectChain {
            plan,
            ring: RingModulator::new(),
            reverb: Reverb::new(),
            pitch,
            pitch_setup: None,
        };
        chain.prepare_pitch();
        chain
    }

    /// Swap in a new plan. Call between blocks only.
    pub fn install(&mut self, plan: EffectPlan) {
        info!("Installing effect plan {}", plan.generation);
        self.plan = plan;
        self.prepare_pitch();
    }

    fn prepare_pitch(&mut self) {
        let s = &self.plan.settings;
        if !s.pitch_active() {
            return;
        }
        let setup = (s.pitch_ratio, s.sample_rate);
        if self.pitch_setup != Some(setup) {
            info!("Pitch shift ratio {} at {} Hz", s.pitch_ratio, s.sample_rate);
            self.pitch.init(s.pitch_ratio, BLOCK_SAMPLES, PITCH_OVERSAMPLE, s.sample_rate);
            self.pitch_setup = Some(setup);
        }
    }

    /// Process one block in place with the given volume factor.
    pub fn apply(&mut self, block: &mut [i16], volume_factor: i8) {
        let s = self.plan.settings;

        if !s.bypass {
            self.plan.filters.process_block(block);
            if s.ring_mod {
                self.ring.process(block, &self.plan.tone);
            }
            if s.reverb {
                self.reverb.process(block, s.decay_factor);
            }
        }

        volume::apply_volume(block, volume_factor);

        if s.pitch_active() {
            self.pitch.process(block);
        }

        if !s.bypass && s.clipping {
            clip::soft_clip(block, clip::clip_factor(s.clip_level));
        }
    }

    /// Volume factor from the plan's settings and an optional pot reading.
    pub fn volume_factor(&self, pot: Option<u16>) -> i8 {
        let s = &self.plan.settings;
        let level = match pot {
            Some(reading) if s.use_pot => volume::pot_level(reading),
            _ => volume::manual_level(s.volume),
        };
        volume::volume_factor(level)
    }

    /// Clear filter, ring modulator and reverb state.
    pub fn reset_state(&mut self) {
        self.plan.filters.reset();
        self.ring.reset();
        self.reverb.reset();
    }

    pub fn plan(&self) -> &EffectPlan {
        &self.plan
    }

    pub fn pitch_shifter(&self) -> &P {
        &self.pitch
    }
}
