//! Best-effort forwarding of output blocks to a real-time transport.
//!
//! The processing task [`publish`](StreamStage::publish)es every finished
//! output block into a shared [`StreamStage`]. A separate polling loop owns
//! the [`StreamBridge`], which takes the newest block and hands it to the
//! transport if that is ready, or drops it. There is no queue: a block that
//! is not picked up before the next one is published is overwritten.
//!
//! Samples are stored with relaxed atomics, so a block read while the task
//! is overwriting it may mix two blocks. That is accepted for live audio.

use core::sync::atomic::{AtomicBool, AtomicI16, AtomicUsize, Ordering};

use log::{debug, warn};

use crate::constants::{BLOCK_BYTES, BLOCK_SAMPLES, STREAM_CHUNK_BYTES};

/// Single-block staging area shared by the task and the bridge.
pub struct StreamStage {
    samples: [AtomicI16; BLOCK_SAMPLES],
    /// Samples in the staged block; 0 once the bridge has taken it.
    len: AtomicUsize,
    enabled: AtomicBool,
}

impl StreamStage {
    pub const fn new() -> Self {
        StreamStage {
            samples: [const { AtomicI16::new(0) }; BLOCK_SAMPLES],
            len: AtomicUsize::new(0),
            enabled: AtomicBool::new(false),
        }
    }

    /// Whether a bridge is attached and wants blocks.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
        if !on {
            self.len.store(0, Ordering::Relaxed);
        }
    }

    /// Stage a block (processing task side). Ignored while no bridge is
    /// attached.
    pub fn publish(&self, block: &[i16]) {
        if !self.is_enabled() {
            return;
        }
        let n = block.len().min(BLOCK_SAMPLES);
        for (slot, &s) in self.samples.iter().zip(&block[..n]) {
            slot.store(s, Ordering::Relaxed);
        }
        self.len.store(n, Ordering::Release);
    }

    /// Take the staged block, if a new one is waiting (bridge side).
    pub fn take(&self, out: &mut [i16; BLOCK_SAMPLES]) -> Option<usize> {
        let n = self.len.swap(0, Ordering::Acquire);
        if n == 0 {
            return None;
        }
        for (dst, slot) in out[..n].iter_mut().zip(&self.samples) {
            *dst = slot.load(Ordering::Relaxed);
        }
        Some(n)
    }
}

impl Default for StreamStage {
    fn default() -> Self {
        Self::new()
    }
}

/// A real-time audio transport (RTSP/RTP session, UDP socket, ...).
pub trait StreamTransport {
    type Error: core::fmt::Debug;

    /// Whether a client is connected and the previous packet has gone out.
    fn ready_to_send(&self) -> bool;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Largest payload accepted by one [`send`](Self::send).
    fn max_chunk_bytes(&self) -> usize {
        STREAM_CHUNK_BYTES
    }
}

/// Result of one [`StreamBridge::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No transport attached.
    Detached,
    /// No new block since the last poll.
    NoBlock,
    /// Block forwarded.
    Sent { bytes: usize },
    /// Transport not ready, block discarded.
    Dropped,
    /// The transport failed part-way; the rest of the block was discarded.
    Failed,
}

/// Counters kept by the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub blocks_sent: u32,
    pub blocks_dropped: u32,
    pub send_errors: u32,
    pub bytes_sent: u64,
}

/// Forwards staged blocks to an attached transport.
pub struct StreamBridge<T> {
    transport: Option<T>,
    stats: StreamStats,
    samples: [i16; BLOCK_SAMPLES],
    bytes: [u8; BLOCK_BYTES],
}

impl<T: StreamTransport> StreamBridge<T> {
    pub const fn new() -> Self {
        StreamBridge {
            transport: None,
            stats: StreamStats {
                blocks_sent: 0,
                blocks_dropped: 0,
                send_errors: 0,
                bytes_sent: 0,
            },
            samples: [0; BLOCK_SAMPLES],
            bytes: [0; BLOCK_BYTES],
        }
    }

    /// Attach a transport and start accepting blocks from `stage`.
    pub fn attach(&mut self, transport: T, stage: &StreamStage) {
        self.transport = Some(transport);
        stage.set_enabled(true);
    }

    /// Stop streaming and hand the transport back.
    pub fn detach(&mut self, stage: &StreamStage) -> Option<T> {
        stage.set_enabled(false);
        self.transport.take()
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Forward the newest staged block, if any.
    pub fn poll(&mut self, stage: &StreamStage) -> PollOutcome {
        let Some(transport) = self.transport.as_mut() else {
            return PollOutcome::Detached;
        };
        let Some(n) = stage.take(&mut self.samples) else {
            return PollOutcome::NoBlock;
        };
        if !transport.ready_to_send() {
            self.stats.blocks_dropped += 1;
            return PollOutcome::Dropped;
        }

        for (dst, s) in self.bytes.chunks_exact_mut(2).zip(&self.samples[..n]) {
            dst.copy_from_slice(&s.to_le_bytes());
        }
        let payload = &self.bytes[..n * 2];
        // Keep chunks sample-aligned.
        let chunk = (transport.max_chunk_bytes() & !1).max(2);
        for part in payload.chunks(chunk) {
            if let Err(e) = transport.send(part) {
                warn!("Stream send failed: {e:?}");
                self.stats.send_errors += 1;
                return PollOutcome::Failed;
            }
        }
        self.stats.blocks_sent += 1;
        self.stats.bytes_sent += payload.len() as u64;
        debug!("Streamed {} bytes", payload.len());
        PollOutcome::Sent { bytes: payload.len() }
    }
}

impl<T: StreamTransport> Default for StreamBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockTransport {
        ready: bool,
        limit: Option<usize>,
        fail_on: Option<usize>,
        sent: Vec<Vec<u8>>,
    }

    impl StreamTransport for MockTransport {
        type Error = ();

        fn ready_to_send(&self) -> bool {
            self.ready
        }

        fn send(&mut self, bytes: &[u8]) -> Result<(), ()> {
            if self.fail_on == Some(self.sent.len()) {
                return Err(());
            }
            self.sent.push(bytes.to_vec());
            Ok(())
        }

        fn max_chunk_bytes(&self) -> usize {
            self.limit.unwrap_or(STREAM_CHUNK_BYTES)
        }
    }

    fn ramp() -> Vec<i16> {
        (0..BLOCK_SAMPLES as i16).collect()
    }

    #[test]
    fn publish_ignored_until_attached() {
        let stage = StreamStage::new();
        stage.publish(&ramp());
        let mut out = [0i16; BLOCK_SAMPLES];
        assert_eq!(stage.take(&mut out), None);

        let mut bridge: StreamBridge<MockTransport> = StreamBridge::new();
        assert_eq!(bridge.poll(&stage), PollOutcome::Detached);
        bridge.attach(MockTransport { ready: true, ..Default::default() }, &stage);
        assert_eq!(bridge.poll(&stage), PollOutcome::NoBlock);
    }

    #[test]
    fn ready_transport_gets_block_in_1024_byte_chunks() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport { ready: true, ..Default::default() }, &stage);

        stage.publish(&ramp());
        assert_eq!(bridge.poll(&stage), PollOutcome::Sent { bytes: BLOCK_BYTES });
        // Taken: nothing new on the next poll.
        assert_eq!(bridge.poll(&stage), PollOutcome::NoBlock);

        let t = bridge.transport().unwrap();
        assert_eq!(t.sent.len(), 2);
        assert!(t.sent.iter().all(|c| c.len() == 1024));
        let bytes = t.sent.concat();
        assert_eq!(&bytes[..4], &[0, 0, 1, 0]);
        assert_eq!(bridge.stats().blocks_sent, 1);
        assert_eq!(bridge.stats().bytes_sent, BLOCK_BYTES as u64);
    }

    #[test]
    fn busy_transport_drops_block() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport::default(), &stage);
        stage.publish(&ramp());
        assert_eq!(bridge.poll(&stage), PollOutcome::Dropped);
        // Dropped, not queued.
        assert_eq!(bridge.poll(&stage), PollOutcome::NoBlock);
        assert_eq!(bridge.stats().blocks_dropped, 1);
        assert!(bridge.transport().unwrap().sent.is_empty());
    }

    #[test]
    fn newer_block_overwrites_unsent_one() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport { ready: true, ..Default::default() }, &stage);
        stage.publish(&[1i16; 8]);
        stage.publish(&[2i16; 4]);
        assert_eq!(bridge.poll(&stage), PollOutcome::Sent { bytes: 8 });
        assert_eq!(bridge.transport().unwrap().sent, vec![vec![2, 0, 2, 0, 2, 0, 2, 0]]);
    }

    #[test]
    fn odd_chunk_limit_stays_sample_aligned() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport { ready: true, limit: Some(5), ..Default::default() }, &stage);
        stage.publish(&[3i16; 5]);
        bridge.poll(&stage);
        let sizes: Vec<usize> = bridge.transport().unwrap().sent.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn send_error_abandons_block() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport { ready: true, fail_on: Some(1), ..Default::default() }, &stage);
        stage.publish(&ramp());
        assert_eq!(bridge.poll(&stage), PollOutcome::Failed);
        assert_eq!(bridge.stats().send_errors, 1);
        assert_eq!(bridge.stats().blocks_sent, 0);
    }

    #[test]
    fn detach_disables_stage() {
        let stage = StreamStage::new();
        let mut bridge = StreamBridge::new();
        bridge.attach(MockTransport { ready: true, ..Default::default() }, &stage);
        stage.publish(&[1i16; 4]);
        let transport = bridge.detach(&stage);
        assert!(transport.is_some());
        assert!(!stage.is_enabled());
        let mut out = [0i16; BLOCK_SAMPLES];
        assert_eq!(stage.take(&mut out), None);
    }
}
