//! The processing task.

use log::{debug, info, warn};

use super::{ActionController, ActionOutcome, ActionRequest, ActionState, LoopEnd};
use crate::constants::BLOCK_SAMPLES;
use crate::effects::{EffectChain, EffectPlan, PitchShifter, PlanSlot};
use crate::error::{ExportError, SetupError};
use crate::io::{block_timeout_ms, normalize_input, AudioIo};
use crate::led::{led_level, LevelIndicator};
use crate::recording::{export_wav, ChunkSink, RecordingBuffer};
use crate::stream::StreamStage;

/// Owns the effect chain, the audio hardware and the recording region and
/// runs one action at a time.
///
/// The board calls [`service`](Self::service) whenever the controller's wake
/// hook fires.
pub struct ActionTask<'a, IO, PS, LED> {
    controller: &'a ActionController,
    plans: &'a PlanSlot,
    stage: Option<&'a StreamStage>,
    io: IO,
    chain: EffectChain<PS>,
    led: LED,
    recording: Option<RecordingBuffer<'a>>,
    raw: [i32; BLOCK_SAMPLES],
    block: [i16; BLOCK_SAMPLES],
    amp_ready: bool,
}

impl<'a, IO, PS, LED> ActionTask<'a, IO, PS, LED>
where
    IO: AudioIo,
    PS: PitchShifter,
    LED: LevelIndicator,
{
    /// Start from the newest published plan, or the defaults if none is
    /// waiting. Without a recording region only pass-through works.
    pub fn new(
        controller: &'a ActionController,
        plans: &'a PlanSlot,
        io: IO,
        pitch: PS,
        led: LED,
        recording: Option<RecordingBuffer<'a>>,
    ) -> Self {
        if recording.is_none() {
            warn!("No recording memory available");
        }
        let plan = plans.take().unwrap_or_default();
        ActionTask {
            controller,
            plans,
            stage: None,
            io,
            chain: EffectChain::new(plan, pitch),
            led,
            recording,
            raw: [0; BLOCK_SAMPLES],
            block: [0; BLOCK_SAMPLES],
            amp_ready: false,
        }
    }

    /// Publish Play and Passthru output to a streaming stage.
    pub fn with_stream(mut self, stage: &'a StreamStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Run the pending action, if any, to completion.
    ///
    /// `sink` receives the file when the action is a WAV download.
    pub fn service<S: ChunkSink>(&mut self, sink: &mut S) -> Option<ActionOutcome> {
        let request = self.controller.take_pending()?;
        self.refresh_plan();

        let outcome = match request {
            ActionRequest::UpdateConfig => {
                self.controller.set_state(ActionState::Configuring);
                match self.start_devices() {
                    Ok(()) => ActionOutcome::ConfigApplied,
                    Err(e) => ActionOutcome::SetupFailed(e),
                }
            }
            ActionRequest::Record => self.with_devices(Self::record),
            ActionRequest::Play => self.with_devices(Self::play),
            ActionRequest::Passthru => self.with_devices(Self::passthru),
            ActionRequest::DownloadWav => self.download(sink),
            ActionRequest::None | ActionRequest::Stop => {
                debug!("Nothing to do for {request:?}");
                ActionOutcome::Ignored
            }
        };

        self.led.off();
        self.controller.finish();
        debug!("{request:?} finished: {outcome:?}");
        Some(outcome)
    }

    /// Install the newest published plan, if there is one.
    fn refresh_plan(&mut self) {
        if let Some(plan) = self.plans.take() {
            self.chain.install(plan);
        }
    }

    fn with_devices(&mut self, action: fn(&mut Self) -> ActionOutcome) -> ActionOutcome {
        match self.start_devices() {
            Ok(()) => action(self),
            Err(e) => ActionOutcome::SetupFailed(e),
        }
    }

    /// Validate the routing and (re)start microphone and amplifier.
    ///
    /// An amplifier failure is tolerated: mic-only actions still run, with
    /// speaker output disabled.
    fn start_devices(&mut self) -> Result<(), SetupError> {
        let plan = self.chain.plan();
        let devices = plan.devices;
        let rate = plan.settings.sample_rate;
        self.amp_ready = false;

        if let Err(e) = devices.validate() {
            self.controller.disable_hardware();
            return Err(e);
        }
        self.controller.enable_hardware();

        if let Err(e) = self.io.start_mic(devices.mic, devices.mic_port, rate) {
            warn!("Unable to start microphone: {e:?}");
            return Err(SetupError::MicStartup);
        }
        info!("Started {:?} microphone on {:?} at {rate} Hz", devices.mic, devices.mic_port);

        match self.io.start_amp(devices.amp, devices.amp_port, rate) {
            Ok(()) => {
                info!("Started {:?} amplifier on {:?}", devices.amp, devices.amp_port);
                self.amp_ready = true;
            }
            Err(e) => warn!("Unable to start amplifier: {e:?}"),
        }
        Ok(())
    }

    fn timeout_ms(&self) -> u32 {
        block_timeout_ms(self.chain.plan().settings.sample_rate)
    }

    /// Read and normalise the next microphone block into `self.block`.
    fn mic_input(&mut self) -> usize {
        let timeout = self.timeout_ms();
        match self.io.read_block(&mut self.raw, timeout) {
            Ok(0) => {
                debug!("Microphone block timed out");
                0
            }
            Ok(n) => {
                let devices = &self.chain.plan().devices;
                normalize_input(&self.raw[..n.min(BLOCK_SAMPLES)], &mut self.block, devices.mic, devices.preamp_gain)
            }
            Err(e) => {
                warn!("Microphone read failed: {e:?}");
                0
            }
        }
    }

    /// Run the effect chain over `self.block[..n]` and send it everywhere it
    /// has to go.
    fn amp_output(&mut self, n: usize) {
        let volume = self.chain.volume_factor(self.io.read_pot());
        let block = &mut self.block[..n];
        self.chain.apply(block, volume);

        if self.amp_ready {
            let timeout = block_timeout_ms(self.chain.plan().settings.sample_rate);
            if let Err(e) = self.io.write_block(block, timeout) {
                warn!("Amplifier write failed: {e:?}");
            }
        }
        if let Some(&first) = block.first() {
            self.led.show(led_level(first, self.chain.plan().devices.led_brightness));
        }
        if let Some(stage) = self.stage {
            stage.publish(block);
        }
    }

    fn record(&mut self) -> ActionOutcome {
        let Some(mut recording) = self.recording.take() else {
            warn!("Recording memory needed to record");
            return ActionOutcome::NoRecording;
        };
        self.controller.set_state(ActionState::Recording);
        recording.rewind(self.chain.plan().settings.sample_rate);
        info!("Recording ...");

        let stop = self.controller.stop_token();
        let end = loop {
            let n = self.mic_input();
            if n > 0 && recording.record_block(&self.block[..n]).is_err() {
                break LoopEnd::BufferFull;
            }
            if stop.is_stopped() {
                break LoopEnd::Stopped;
            }
        };

        let samples = recording.sample_count();
        info!("{end:?} recording of {samples} samples");
        self.recording = Some(recording);
        ActionOutcome::Recorded { samples, end }
    }

    fn play(&mut self) -> ActionOutcome {
        let Some(recording) = self.recording.take() else {
            warn!("Recording memory needed to play");
            return ActionOutcome::NoRecording;
        };
        self.controller.set_state(ActionState::Playing);
        info!("Playing, initial volume: {}", self.chain.volume_factor(self.io.read_pot()));
        self.chain.reset_state();

        let stop = self.controller.stop_token();
        let mut cursor = recording.cursor();
        let end = loop {
            self.refresh_plan();
            let n = recording.read_block(&mut cursor, &mut self.block);
            if n == 0 {
                break LoopEnd::Finished;
            }
            self.amp_output(n);
            if stop.is_stopped() {
                break LoopEnd::Stopped;
            }
        };

        let samples = cursor.samples_read();
        info!("{end:?} playing of {samples} samples");
        self.recording = Some(recording);
        ActionOutcome::Played { samples, end }
    }

    fn passthru(&mut self) -> ActionOutcome {
        self.controller.set_state(ActionState::Passthru);
        info!("Passthru started");
        self.chain.reset_state();

        let stop = self.controller.stop_token();
        let mut blocks = 0;
        while !stop.is_stopped() {
            self.refresh_plan();
            let n = self.mic_input();
            if n > 0 {
                self.amp_output(n);
                blocks += 1;
            }
        }
        info!("Passthru stopped after {blocks} blocks");
        ActionOutcome::Passthru { blocks }
    }

    fn download<S: ChunkSink>(&mut self, sink: &mut S) -> ActionOutcome {
        self.controller.set_state(ActionState::Exporting);
        let mode = self.chain.plan().settings.export_mode;
        match export_wav(self.recording.as_mut(), mode, &mut self.chain, sink) {
            Ok(bytes) => ActionOutcome::Exported { bytes },
            Err(ExportError::NoRecording) => {
                warn!("Recording memory needed for download");
                ActionOutcome::NoRecording
            }
            Err(ExportError::Sink(_)) => {
                warn!("Download aborted by the receiver");
                ActionOutcome::ExportFailed
            }
        }
    }

    pub fn controller(&self) -> &'a ActionController {
        self.controller
    }

    pub fn plan(&self) -> &EffectPlan {
        self.chain.plan()
    }

    pub fn recording(&self) -> Option<&RecordingBuffer<'a>> {
        self.recording.as_ref()
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn led(&self) -> &LED {
        &self.led
    }

    /// Whether the amplifier started for the last action.
    pub fn amp_ready(&self) -> bool {
        self.amp_ready
    }
}
