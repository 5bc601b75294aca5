//! Error types shared across the crate.
//!
//! Everything here is recoverable: the processing task logs the condition,
//! skips or ends the current action and returns to idle.

use crate::io::{DeviceKind, Port};

/// Failure while bringing up the microphone / amplifier for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// The device kind cannot be driven from the selected port.
    ///
    /// This is a wiring/configuration fault; the audio subsystem stays
    /// disabled until the routing is changed.
    #[error("{kind:?} device not supported on {port:?}, only I2S is")]
    UnsupportedRouting { kind: DeviceKind, port: Port },
    /// The microphone driver refused to start.
    #[error("unable to start microphone")]
    MicStartup,
}

/// The recording region has no room for the samples offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("recording buffer full, stored {stored} of the offered samples")]
pub struct CapacityExceeded {
    /// Samples that did fit before the region ran out.
    pub stored: usize,
}

/// Failure while streaming a recording out as WAV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExportError<E> {
    /// No recording memory is attached.
    #[error("no recording memory available")]
    NoRecording,
    /// The sink rejected a chunk.
    #[error("sink rejected chunk: {0:?}")]
    Sink(E),
}

/// A byte slice does not hold a mono 16-bit PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WavError {
    #[error("need 44 header bytes, got {0}")]
    TooShort(usize),
    #[error("missing RIFF/WAVE/fmt/data markers")]
    BadMagic,
    #[error("not mono 16-bit PCM")]
    Unsupported,
}
