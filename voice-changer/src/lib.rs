//! # voice-changer
//!
//! A `no_std`, zero-allocation real-time voice effects engine for
//! microcontroller audio boards. Microphone blocks are filtered and
//! transformed in place, then sent to a speaker, stored in a recording
//! region, or forwarded to a live audio stream, all inside the time budget
//! of one DMA block.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | DSP | [`dsp`] | Biquad designs, Butterworth cascades, the per-band filter bank |
//! | Effects | [`effects`] | Ordered effect chain, swappable effect plans |
//! | Config | [`settings`] | [`EffectSettings`], named [`Setting`] changes |
//! | I/O | [`io`] | Board trait, device routing, sample conversion, plan hand-off |
//! | Storage | [`recording`] | Recording region, WAV header, chunked export |
//! | Control | [`action`] | Record / play / pass-through state machine |
//! | Output | [`stream`] / [`led`] | Live streaming bridge, level LED |
//!
//! ## Quick start
//!
//! ```ignore
//! use voice_changer::action::{ActionController, ActionRequest, ActionTask};
//! use voice_changer::effects::{Configurator, NoPitchShift, PlanSlot};
//! use voice_changer::led::NoLed;
//! use voice_changer::recording::RecordingBuffer;
//! use voice_changer::settings::{Band, Setting};
//!
//! static CONTROLLER: ActionController = ActionController::new(wake_action_task);
//! static PLANS: PlanSlot = PlanSlot::new();
//!
//! // Configuration side (web handler, buttons):
//! let mut cfg = Configurator::default();
//! cfg.apply(Setting::BandEnabled(Band::LowPass, true));
//! cfg.apply(Setting::BandFrequency(Band::LowPass, 500.0));
//! cfg.publish(&PLANS);
//! CONTROLLER.request(ActionRequest::Passthru);
//!
//! // Processing task:
//! let recording = RecordingBuffer::new(psram, 16_000);
//! let mut task = ActionTask::new(&CONTROLLER, &PLANS, board_io, NoPitchShift, NoLed, recording);
//! loop {
//!     wait_for_wake();
//!     task.service(&mut http_sink);
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `led` | yes | PWM level LED via `embedded-hal` ([`led::LevelLed`]) |
//! | `serde` | no | `Serialize` / `Deserialize` on configuration types |
//!
//! ## Audio parameters
//!
//! - **Block size:** 1024 samples ([`constants::BLOCK_SAMPLES`])
//! - **Sample rate:** configurable, 16 000 Hz by default
//! - **Sample format:** `i16`, mono
//! - **Recording:** 44-byte WAV header + little-endian PCM

#![cfg_attr(not(test), no_std)]

pub mod action;
pub mod constants;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod io;
pub mod led;
pub mod recording;
pub mod settings;
pub mod stream;

pub use settings::{EffectSettings, Setting};
