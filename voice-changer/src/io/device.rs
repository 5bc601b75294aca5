//! Microphone / amplifier routing and the hardware I/O contract.

use core::fmt::Debug;

use log::error;

use crate::constants::BLOCK_SAMPLES;
use crate::error::SetupError;

/// Kind of audio peripheral attached to a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceKind {
    I2s,
    Pdm,
    /// Built-in ADC (microphone) or DAC (amplifier).
    Adc,
}

/// Audio peripheral port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    Zero,
    One,
}

impl Port {
    /// Whether a device of `kind` can be driven from this port.
    pub const fn supports(self, kind: DeviceKind) -> bool {
        match self {
            Port::Zero => true,
            Port::One => matches!(kind, DeviceKind::I2s),
        }
    }
}

/// Which devices are attached where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    pub mic: DeviceKind,
    pub amp: DeviceKind,
    pub mic_port: Port,
    pub amp_port: Port,
    /// Microphone words are shifted right by `17 - preamp_gain`.
    pub preamp_gain: u8,
    /// Level LED brightness, 0..=8.
    pub led_brightness: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            mic: DeviceKind::I2s,
            amp: DeviceKind::I2s,
            mic_port: Port::Zero,
            amp_port: Port::One,
            preamp_gain: 3,
            led_brightness: 0,
        }
    }
}

impl DeviceConfig {
    /// Check that both devices sit on ports able to drive them.
    pub fn validate(&self) -> Result<(), SetupError> {
        for (kind, port) in [(self.amp, self.amp_port), (self.mic, self.mic_port)] {
            if !port.supports(kind) {
                error!("Only I2S devices are supported on {port:?}, found {kind:?}");
                return Err(SetupError::UnsupportedRouting { kind, port });
            }
        }
        Ok(())
    }
}

/// Board-specific audio hardware.
///
/// The processing task drives one action at a time through this trait: it
/// (re)starts the devices, then reads microphone blocks and writes speaker
/// blocks until the action ends.
pub trait AudioIo {
    type Error: Debug;

    /// (Re)start the microphone. Any running devices are shut down first.
    fn start_mic(&mut self, kind: DeviceKind, port: Port, sample_rate: u32) -> Result<(), Self::Error>;

    /// Start the amplifier after the microphone is running.
    fn start_amp(&mut self, kind: DeviceKind, port: Port, sample_rate: u32) -> Result<(), Self::Error>;

    /// Wait up to `timeout_ms` for the next block of raw microphone words.
    ///
    /// Returns the number of words written to `buf`; 0 means the wait timed
    /// out and the block should be skipped.
    fn read_block(&mut self, buf: &mut [i32; BLOCK_SAMPLES], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Queue samples for the amplifier, waiting up to `timeout_ms` for room.
    fn write_block(&mut self, samples: &[i16], timeout_ms: u32) -> Result<(), Self::Error>;

    /// Latest 12-bit volume potentiometer reading, if one is fitted.
    fn read_pot(&mut self) -> Option<u16> {
        None
    }
}

/// Time to wait for one block: twice its duration, at least 1 ms.
pub fn block_timeout_ms(sample_rate: u32) -> u32 {
    let block_ms = (BLOCK_SAMPLES as u32 * 1000) / sample_rate.max(1);
    (2 * block_ms).max(1)
}
