//! Effect configuration.
//!
//! [`EffectSettings`] is the complete, copyable description of the effect
//! chain. Changes arrive one at a time as [`Setting`] values; applying one
//! reports through [`Rebuild`] how much of the effect plan has to be
//! regenerated.

use crate::dsp::BiquadKind;
use crate::io::{DeviceConfig, DeviceKind, Port};
use crate::recording::ExportMode;

use crate::constants::DEFAULT_SAMPLE_RATE;

/// Highest manual volume value.
pub const MAX_VOLUME: u8 = 7;
/// Highest clipping level.
pub const MAX_CLIP_LEVEL: u8 = 10;
/// Highest preamp gain (a shift of 1).
pub const MAX_PREAMP_GAIN: u8 = 16;

/// The configurable filter bands, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Band {
    BandPass,
    HighPass,
    LowPass,
    HighShelf,
    LowShelf,
    Peak,
}

impl Band {
    pub const COUNT: usize = 6;

    /// Every band in the order the chain applies them.
    pub const ALL: [Band; Band::COUNT] = [
        Band::BandPass,
        Band::HighPass,
        Band::LowPass,
        Band::HighShelf,
        Band::LowShelf,
        Band::Peak,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Biquad response used for this band.
    pub const fn kind(self) -> BiquadKind {
        match self {
            Band::BandPass => BiquadKind::BandPass,
            Band::HighPass => BiquadKind::HighPass,
            Band::LowPass => BiquadKind::LowPass,
            Band::HighShelf => BiquadKind::HighShelf,
            Band::LowShelf => BiquadKind::LowShelf,
            Band::Peak => BiquadKind::Peak,
        }
    }
}

/// Parameters of one filter band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandSettings {
    pub enabled: bool,
    /// Cutoff or centre frequency in Hz.
    pub freq_hz: f32,
    /// Only used for single-section cascades.
    pub q: f32,
    /// Only used by shelf and peak bands.
    pub gain_db: f32,
    /// Number of cascaded sections (pass/stop bands only).
    pub order: u8,
}

impl Default for BandSettings {
    fn default() -> Self {
        BandSettings {
            enabled: false,
            freq_hz: 4000.0,
            q: 0.7,
            gain_db: 3.0,
            order: 1,
        }
    }
}

/// Everything the effect chain needs to know.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectSettings {
    pub band_pass: BandSettings,
    pub high_pass: BandSettings,
    pub low_pass: BandSettings,
    pub high_shelf: BandSettings,
    pub low_shelf: BandSettings,
    pub peak: BandSettings,

    pub ring_mod: bool,
    pub tone_freq_hz: u32,
    /// Ring modulator depth, 1..=127.
    pub tone_amplitude: u8,

    pub reverb: bool,
    /// Echo divisor is `decay_factor + 1`.
    pub decay_factor: u8,

    pub clipping: bool,
    /// 0..=10, higher compresses harder.
    pub clip_level: u8,

    /// 1.0 disables the pitch shifter.
    pub pitch_ratio: f32,

    /// Manual volume, 0..=7. Ignored when `use_pot` is set.
    pub volume: u8,
    pub use_pot: bool,

    /// Skip filters, ring modulation, reverb and clipping.
    pub bypass: bool,

    pub sample_rate: u32,

    /// How a recording is rendered when downloaded.
    pub export_mode: ExportMode,
}

impl Default for EffectSettings {
    fn default() -> Self {
        EffectSettings {
            band_pass: BandSettings::default(),
            high_pass: BandSettings::default(),
            low_pass: BandSettings::default(),
            high_shelf: BandSettings::default(),
            low_shelf: BandSettings::default(),
            peak: BandSettings::default(),
            ring_mod: false,
            tone_freq_hz: 80,
            tone_amplitude: 127,
            reverb: false,
            decay_factor: 1,
            clipping: false,
            clip_level: 1,
            pitch_ratio: 1.0,
            volume: 3,
            use_pot: false,
            bypass: false,
            sample_rate: DEFAULT_SAMPLE_RATE,
            export_mode: ExportMode::Processed,
        }
    }
}

impl EffectSettings {
    pub fn band(&self, band: Band) -> &BandSettings {
        match band {
            Band::BandPass => &self.band_pass,
            Band::HighPass => &self.high_pass,
            Band::LowPass => &self.low_pass,
            Band::HighShelf => &self.high_shelf,
            Band::LowShelf => &self.low_shelf,
            Band::Peak => &self.peak,
        }
    }

    pub fn band_mut(&mut self, band: Band) -> &mut BandSettings {
        match band {
            Band::BandPass => &mut self.band_pass,
            Band::HighPass => &mut self.high_pass,
            Band::LowPass => &mut self.low_pass,
            Band::HighShelf => &mut self.high_shelf,
            Band::LowShelf => &mut self.low_shelf,
            Band::Peak => &mut self.peak,
        }
    }

    /// Whether the pitch shifter has to run.
    pub fn pitch_active(&self) -> bool {
        self.pitch_ratio != 1.0
    }
}

/// How much of the effect plan a settings change invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebuild {
    /// Only the settings snapshot changes (flags, volume, levels, devices).
    Snapshot,
    /// The cascade of one band has to be redesigned.
    Cascade(Band),
    /// The ring modulator sine table has to be regenerated.
    ToneTable,
    /// Every cascade and the tone table depend on the change.
    Everything,
}

/// A single named configuration change.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Setting {
    BandEnabled(Band, bool),
    BandFrequency(Band, f32),
    BandQ(Band, f32),
    BandGain(Band, f32),
    BandOrder(Band, u8),
    RingMod(bool),
    ToneFrequency(u32),
    ToneAmplitude(u8),
    Reverb(bool),
    DecayFactor(u8),
    Clipping(bool),
    ClipLevel(u8),
    PitchRatio(f32),
    Volume(u8),
    UsePot(bool),
    Bypass(bool),
    SampleRate(u32),
    ExportMode(ExportMode),
    PreampGain(u8),
    MicKind(DeviceKind),
    AmpKind(DeviceKind),
    MicPort(Port),
    AmpPort(Port),
    LedBrightness(u8),
}

impl Setting {
    /// Store the change, clamping values to their valid range.
    pub fn apply(self, settings: &mut EffectSettings, devices: &mut DeviceConfig) -> Rebuild {
        match self {
            Setting::BandEnabled(band, on) => {
                settings.band_mut(band).enabled = on;
                Rebuild::Cascade(band)
            }
            Setting::BandFrequency(band, hz) => {
                settings.band_mut(band).freq_hz = hz;
                Rebuild::Cascade(band)
            }
            Setting::BandQ(band, q) => {
                settings.band_mut(band).q = q;
                Rebuild::Cascade(band)
            }
            Setting::BandGain(band, db) => {
                settings.band_mut(band).gain_db = db;
                Rebuild::Cascade(band)
            }
            Setting::BandOrder(band, order) => {
                settings.band_mut(band).order = order;
                Rebuild::Cascade(band)
            }
            Setting::RingMod(on) => {
                settings.ring_mod = on;
                Rebuild::Snapshot
            }
            Setting::ToneFrequency(hz) => {
                settings.tone_freq_hz = hz;
                Rebuild::ToneTable
            }
            Setting::ToneAmplitude(amp) => {
                settings.tone_amplitude = amp.clamp(1, i8::MAX as u8);
                Rebuild::ToneTable
            }
            Setting::Reverb(on) => {
                settings.reverb = on;
                Rebuild::Snapshot
            }
            Setting::DecayFactor(decay) => {
                settings.decay_factor = decay;
                Rebuild::Snapshot
            }
            Setting::Clipping(on) => {
                settings.clipping = on;
                Rebuild::Snapshot
            }
            Setting::ClipLevel(level) => {
                settings.clip_level = level.min(MAX_CLIP_LEVEL);
                Rebuild::Snapshot
            }
            Setting::PitchRatio(ratio) => {
                settings.pitch_ratio = ratio;
                Rebuild::Snapshot
            }
            Setting::Volume(volume) => {
                settings.volume = volume.min(MAX_VOLUME);
                Rebuild::Snapshot
            }
            Setting::UsePot(on) => {
                settings.use_pot = on;
                Rebuild::Snapshot
            }
            Setting::Bypass(on) => {
                settings.bypass = on;
                Rebuild::Snapshot
            }
            Setting::SampleRate(rate) => {
                settings.sample_rate = rate.max(1);
                Rebuild::Everything
            }
            Setting::ExportMode(mode) => {
                settings.export_mode = mode;
                Rebuild::Snapshot
            }
            Setting::PreampGain(gain) => {
                devices.preamp_gain = gain.min(MAX_PREAMP_GAIN);
                Rebuild::Snapshot
            }
            Setting::MicKind(kind) => {
                devices.mic = kind;
                Rebuild::Snapshot
            }
            Setting::AmpKind(kind) => {
                devices.amp = kind;
                Rebuild::Snapshot
            }
            Setting::MicPort(port) => {
                devices.mic_port = port;
                Rebuild::Snapshot
            }
            Setting::AmpPort(port) => {
                devices.amp_port = port;
                Rebuild::Snapshot
            }
            Setting::LedBrightness(level) => {
                devices.led_brightness = level;
                Rebuild::Snapshot
            }
        }
    }
}
