//! Hardware-facing I/O.
//!
//! ## Components
//!
//! | Item | Description |
//! |------|-------------|
//! | [`AudioIo`] | Board trait: start devices, read mic blocks, write speaker blocks |
//! | [`DeviceConfig`] | Microphone / amplifier kinds, ports, preamp gain |
//! | [`normalize_input`] | 32-bit microphone words → 16-bit samples |
//! | [`LatestSlot`] | Lock-free latest-wins hand-off of effect plans |
//!
//! ## Port routing
//!
//! Port 0 drives I2S, PDM and the built-in ADC/DAC. Port 1 drives I2S only;
//! any other device there fails [`DeviceConfig::validate`].

pub mod convert;
pub mod device;
pub mod latest;

pub use convert::normalize_input;
pub use device::{block_timeout_ms, AudioIo, DeviceConfig, DeviceKind, Port};
pub use latest::LatestSlot;
