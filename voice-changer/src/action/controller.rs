//! Interrupt-safe request slot, single-flight permit and stop flag.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use log::{debug, warn};

use super::{ActionRequest, ActionState, RequestOutcome};

/// Shared between request sources (interrupts, web handlers) and the
/// processing task. Every method takes `&self`, so it can live in a
/// `static`.
pub struct ActionController {
    pending: AtomicU8,
    /// Single-flight permit; `true` while an action owns it.
    busy: AtomicBool,
    stop: AtomicBool,
    state: AtomicU8,
    hardware_ok: AtomicBool,
    /// Wakes the processing task.
    wake: fn(),
}

impl ActionController {
    pub const fn new(wake: fn()) -> Self {
        ActionController {
            pending: AtomicU8::new(ActionRequest::None as u8),
            busy: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            state: AtomicU8::new(ActionState::Idle as u8),
            hardware_ok: AtomicBool::new(true),
            wake,
        }
    }

    /// Post a request.
    pub fn request(&self, request: ActionRequest) -> RequestOutcome {
        match request {
            ActionRequest::None => return RequestOutcome::Accepted,
            ActionRequest::Stop => {
                self.stop();
                return RequestOutcome::Accepted;
            }
            r if r.needs_audio_hardware() && !self.hardware_available() => {
                warn!("{r:?} rejected, audio hardware routing unsupported");
                return RequestOutcome::RejectedUnsupportedHardware;
            }
            _ => {}
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("{request:?} dropped, previous action still running");
            return RequestOutcome::RejectedBusy;
        }

        self.stop.store(false, Ordering::Relaxed);
        self.pending.store(request as u8, Ordering::Release);
        debug!("{request:?} accepted");
        (self.wake)();
        RequestOutcome::Accepted
    }

    /// Ask the running action to end at the next block boundary.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Take the pending request (processing task side).
    pub fn take_pending(&self) -> Option<ActionRequest> {
        match ActionRequest::from_u8(self.pending.swap(ActionRequest::None as u8, Ordering::Acquire)) {
            ActionRequest::None => None,
            r => Some(r),
        }
    }

    pub fn stop_token(&self) -> StopToken<'_> {
        StopToken { flag: &self.stop }
    }

    /// End the current action: clear the stop flag, go idle, release the
    /// permit.
    pub fn finish(&self) {
        self.stop.store(false, Ordering::Relaxed);
        self.set_state(ActionState::Idle);
        self.busy.store(false, Ordering::Release);
    }

    pub fn state(&self) -> ActionState {
        ActionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub(crate) fn set_state(&self, state: ActionState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Whether an action currently holds the permit.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn hardware_available(&self) -> bool {
        self.hardware_ok.load(Ordering::Relaxed)
    }

    /// Reject audio actions until the routing is fixed.
    pub fn disable_hardware(&self) {
        self.hardware_ok.store(false, Ordering::Relaxed);
    }

    pub fn enable_hardware(&self) {
        self.hardware_ok.store(true, Ordering::Relaxed);
    }
}

/// Cooperative cancellation flag, checked once per block.
#[derive(Clone, Copy)]
pub struct StopToken<'a> {
    flag: &'a AtomicBool,
}

impl StopToken<'_> {
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for StopToken<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StopToken").field("stopped", &self.is_stopped()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;

    fn noop() {}

    static WAKES: AtomicUsize = AtomicUsize::new(0);

    fn count_wake() {
        WAKES.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn accept_then_busy_then_accept_after_finish() {
        let ctl = ActionController::new(noop);
        assert_eq!(ctl.request(ActionRequest::Record), RequestOutcome::Accepted);
        assert!(ctl.is_busy());
        assert_eq!(ctl.request(ActionRequest::Play), RequestOutcome::RejectedBusy);
        assert_eq!(ctl.take_pending(), Some(ActionRequest::Record));
        assert_eq!(ctl.take_pending(), None);
        ctl.finish();
        assert_eq!(ctl.request(ActionRequest::Play), RequestOutcome::Accepted);
        assert_eq!(ctl.take_pending(), Some(ActionRequest::Play));
    }

    #[test]
    fn accepted_request_wakes_task() {
        let ctl = ActionController::new(count_wake);
        let before = WAKES.load(Ordering::SeqCst);
        ctl.request(ActionRequest::Passthru);
        ctl.request(ActionRequest::Record); // busy, no wake
        assert_eq!(WAKES.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn stop_never_takes_permit() {
        let ctl = ActionController::new(noop);
        assert_eq!(ctl.request(ActionRequest::Stop), RequestOutcome::Accepted);
        assert!(!ctl.is_busy());
        assert!(ctl.stop_token().is_stopped());
        // A new action starts with the flag cleared.
        ctl.request(ActionRequest::Passthru);
        assert!(!ctl.stop_token().is_stopped());
        // Stop while busy is honoured without releasing the permit.
        ctl.request(ActionRequest::Stop);
        assert!(ctl.stop_requested());
        assert!(ctl.is_busy());
        ctl.finish();
        assert!(!ctl.stop_requested());
        assert_eq!(ctl.state(), ActionState::Idle);
    }

    #[test]
    fn none_is_a_no_op() {
        let ctl = ActionController::new(noop);
        assert_eq!(ctl.request(ActionRequest::None), RequestOutcome::Accepted);
        assert!(!ctl.is_busy());
        assert_eq!(ctl.take_pending(), None);
    }

    #[test]
    fn unsupported_hardware_rejects_audio_actions_only() {
        let ctl = ActionController::new(noop);
        ctl.disable_hardware();
        for r in [ActionRequest::Record, ActionRequest::Play, ActionRequest::Passthru] {
            assert_eq!(ctl.request(r), RequestOutcome::RejectedUnsupportedHardware);
        }
        assert!(!ctl.is_busy());
        assert_eq!(ctl.request(ActionRequest::UpdateConfig), RequestOutcome::Accepted);
        ctl.finish();
        assert_eq!(ctl.request(ActionRequest::DownloadWav), RequestOutcome::Accepted);
        ctl.finish();
        ctl.enable_hardware();
        assert_eq!(ctl.request(ActionRequest::Record), RequestOutcome::Accepted);
    }

    #[test]
    fn request_codes_round_trip() {
        for r in [
            ActionRequest::None,
            ActionRequest::UpdateConfig,
            ActionRequest::Record,
            ActionRequest::Play,
            ActionRequest::Passthru,
            ActionRequest::DownloadWav,
            ActionRequest::Stop,
        ] {
            assert_eq!(ActionRequest::from_u8(r as u8), r);
        }
        assert_eq!(ActionRequest::from_u8(200), ActionRequest::None);
    }

    #[test]
    fn single_flight_under_contention() {
        use std::sync::Arc;
        let ctl = Arc::new(ActionController::new(noop));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctl = ctl.clone();
                std::thread::spawn(move || ctl.request(ActionRequest::Record))
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&o| o == RequestOutcome::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
