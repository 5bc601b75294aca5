//! Record / play / pass-through state machine.
//!
//! Button interrupts and the configuration server call
//! [`ActionController::request`]. At most one action runs at a time: an
//! accepted request takes the single-flight permit, is stored in the pending
//! slot and wakes the processing task, which runs it through
//! [`ActionTask::service`] and releases the permit when done. A
//! [`Stop`](ActionRequest::Stop) request never touches the permit; it sets a
//! flag the running loop checks once per block.
//!
//! ```text
//!            Record            Play             Passthru
//!   Idle ───────────▶ Recording / Playing / Passthru ───▶ Idle
//!     ▲          (stop flag, end of data, buffer full)       │
//!     └──────────────────────────────────────────────────────┘
//! ```

mod controller;
mod task;


pub use controller::{ActionController, StopToken};
pub use task::ActionTask;

use crate::error::SetupError;

/// A request posted to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionRequest {
    None = 0,
    UpdateConfig = 1,
    Record = 2,
    Play = 3,
    Passthru = 4,
    DownloadWav = 5,
    Stop = 6,
}

impl ActionRequest {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => ActionRequest::UpdateConfig,
            2 => ActionRequest::Record,
            3 => ActionRequest::Play,
            4 => ActionRequest::Passthru,
            5 => ActionRequest::DownloadWav,
            6 => ActionRequest::Stop,
            _ => ActionRequest::None,
        }
    }

    /// Whether the action moves audio through the microphone or amplifier.
    pub fn needs_audio_hardware(self) -> bool {
        matches!(self, ActionRequest::Record | ActionRequest::Play | ActionRequest::Passthru)
    }
}

/// What the processing task is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionState {
    Idle = 0,
    Recording = 1,
    Playing = 2,
    Passthru = 3,
    /// Restarting devices for a configuration update.
    Configuring = 4,
    /// Streaming a recording out as WAV.
    Exporting = 5,
}

impl ActionState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => ActionState::Recording,
            2 => ActionState::Playing,
            3 => ActionState::Passthru,
            4 => ActionState::Configuring,
            5 => ActionState::Exporting,
            _ => ActionState::Idle,
        }
    }
}

/// Answer to [`ActionController::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Accepted,
    /// Another action holds the permit; the request was dropped.
    RejectedBusy,
    /// The device routing is invalid, audio actions are disabled.
    RejectedUnsupportedHardware,
}

/// Why a recording or playback loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    /// End of the recording reached.
    Finished,
    /// The stop flag was raised.
    Stopped,
    /// The recording region ran out.
    BufferFull,
}

/// Result of one serviced action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Recorded { samples: usize, end: LoopEnd },
    Played { samples: usize, end: LoopEnd },
    Passthru { blocks: usize },
    Exported { bytes: usize },
    ConfigApplied,
    /// Devices could not be started; the action was skipped.
    SetupFailed(SetupError),
    /// No recording memory is attached.
    NoRecording,
    /// The export sink failed part-way.
    ExportFailed,
    /// The request carried no work.
    Ignored,
}
