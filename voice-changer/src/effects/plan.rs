//! Effect plans: complete, swappable effect configurations.
//!
//! The configuration side owns a [`Configurator`]. Each [`Setting`] updates
//! its working plan, rebuilding only what the change invalidates, and
//! [`publish`](Configurator::publish) posts a copy to the processing task
//! through a [`PlanSlot`]. A plan the task has not picked up yet is replaced
//! by the next one. The task installs the newest plan between blocks, so it
//! never sees a half-built cascade.

use log::{debug, info};

use super::ring_mod::ToneTable;
use crate::dsp::{FilterBank, QTable};
use crate::io::{DeviceConfig, LatestSlot};
use crate::settings::{EffectSettings, Rebuild, Setting};

/// Hand-off carrying the newest plan to the processing task.
pub type PlanSlot = LatestSlot<EffectPlan>;

/// Everything the processing task needs to run the effect chain.
#[derive(Debug, Clone)]
pub struct EffectPlan {
    pub settings: EffectSettings,
    pub devices: DeviceConfig,
    pub filters: FilterBank,
    pub tone: ToneTable,
    /// Bumped on every change, so the task can tell plans apart.
    pub generation: u32,
}

impl EffectPlan {
    /// Design every cascade and the tone table from scratch.
    pub fn build(settings: &EffectSettings, devices: &DeviceConfig, table: &QTable) -> Self {
        let filters = FilterBank::build(settings, table);
        let tone = ToneTable::generate(settings.tone_freq_hz, settings.tone_amplitude, settings.sample_rate);
        info!("Effect plan built with {} filter stages", filters.stage_count());
        EffectPlan {
            settings: *settings,
            devices: *devices,
            filters,
            tone,
            generation: 0,
        }
    }
}

impl Default for EffectPlan {
    fn default() -> Self {
        EffectPlan::build(&EffectSettings::default(), &DeviceConfig::default(), &QTable::compute())
    }
}

/// Owner of the live configuration on the producer side.
pub struct Configurator {
    table: QTable,
    plan: EffectPlan,
}

impl Configurator {
    pub fn new(settings: EffectSettings, devices: DeviceConfig) -> Self {
        let table = QTable::compute();
        let plan = EffectPlan::build(&settings, &devices, &table);
        Configurator { table, plan }
    }

    /// Apply one change and update the working plan.
    pub fn apply(&mut self, setting: Setting) -> Rebuild {
        let plan = &mut self.plan;
        let rebuild = setting.apply(&mut plan.settings, &mut plan.devices);
        match rebuild {
            Rebuild::Snapshot => {}
            Rebuild::Cascade(band) => {
                plan.filters.rebuild_band(band, &plan.settings, &self.table);
                debug!("Rebuilt {band:?} cascade, {} stages in total", plan.filters.stage_count());
            }
            Rebuild::ToneTable => {
                let s = &plan.settings;
                plan.tone = ToneTable::generate(s.tone_freq_hz, s.tone_amplitude, s.sample_rate);
            }
            Rebuild::Everything => {
                let generation = plan.generation;
                *plan = EffectPlan::build(&plan.settings, &plan.devices, &self.table);
                plan.generation = generation;
            }
        }
        plan.generation = plan.generation.wrapping_add(1);
        rebuild
    }

    /// Apply several changes.
    pub fn apply_all(&mut self, settings: impl IntoIterator<Item = Setting>) {
        for setting in settings {
            self.apply(setting);
        }
    }

    /// Post a copy of the current plan to the processing task.
    pub fn publish(&self, slot: &PlanSlot) {
        if slot.post(self.plan.clone()) {
            debug!("Effect plan {} replaced an unclaimed plan", self.plan.generation);
        }
    }

    pub fn plan(&self) -> &EffectPlan {
        &self.plan
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.plan.settings
    }

    pub fn devices(&self) -> &DeviceConfig {
        &self.plan.devices
    }

    pub fn q_table(&self) -> &QTable {
        &self.table
    }
}

impl Default for Configurator {
    fn default() -> Self {
        Configurator::new(EffectSettings::default(), DeviceConfig::default())
    }
}
