//! Lock-free latest-value slot (triple buffer).
//!
//! Carries complete effect plans from the configuration side to the
//! processing task. The producer never blocks and never fails: a value that
//! has not been taken yet is replaced by the next [`post`](LatestSlot::post),
//! so the consumer always receives the newest one.
//!
//! Three slots rotate between the producer, the consumer and a shared
//! middle position. Each side only touches the slot it owns; ownership moves
//! by swapping the shared index.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`post()`](LatestSlot::post) (the producer).
//! - Only ONE context may call [`take()`](LatestSlot::take) (the consumer).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

/// Set in `shared` while the middle slot holds a value not yet taken.
const FRESH: u8 = 0b100;
const INDEX: u8 = 0b011;

/// Single-value hand-off where the newest post wins.
pub struct LatestSlot<T> {
    slots: [UnsafeCell<Option<T>>; 3],
    /// Index of the middle slot, plus [`FRESH`].
    shared: AtomicU8,
    /// Slot the producer writes next (producer only).
    back: AtomicU8,
    /// Slot the consumer read last (consumer only).
    front: AtomicU8,
}

// SAFETY: values move from the producer to the consumer context. The three
// indices always form a permutation of 0..3, so no slot is owned by both
// sides, and the acquire/release swaps on `shared` order the slot accesses.
unsafe impl<T: Send> Sync for LatestSlot<T> {}
unsafe impl<T: Send> Send for LatestSlot<T> {}

impl<T> LatestSlot<T> {
    pub const fn new() -> Self {
        LatestSlot {
            slots: [const { UnsafeCell::new(None) }; 3],
            shared: AtomicU8::new(1),
            back: AtomicU8::new(0),
            front: AtomicU8::new(2),
        }
    }

    /// Post a value (producer side).
    ///
    /// Returns `true` if it replaced a value the consumer had not taken.
    pub fn post(&self, val: T) -> bool {
        let back = self.back.load(Ordering::Relaxed);
        // SAFETY: sole producer, and `back` is owned by the producer.
        unsafe { *self.slots[usize::from(back)].get() = Some(val) };
        let prev = self.shared.swap(back | FRESH, Ordering::AcqRel);
        self.back.store(prev & INDEX, Ordering::Relaxed);
        prev & FRESH != 0
    }

    /// Take the newest value, if one was posted since the last take
    /// (consumer side).
    pub fn take(&self) -> Option<T> {
        if !self.has_update() {
            return None;
        }
        let front = self.front.load(Ordering::Relaxed);
        let prev = self.shared.swap(front, Ordering::AcqRel);
        let idx = prev & INDEX;
        self.front.store(idx, Ordering::Relaxed);
        // SAFETY: sole consumer, and `idx` now belongs to the consumer.
        unsafe { (*self.slots[usize::from(idx)].get()).take() }
    }

    /// Whether a value is waiting.
    pub fn has_update(&self) -> bool {
        self.shared.load(Ordering::Acquire) & FRESH != 0
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_until_posted() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert!(!slot.has_update());
        assert_eq!(slot.take(), None);
        assert!(!slot.post(1));
        assert!(slot.has_update());
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn newest_post_wins() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert!(!slot.post(7));
        assert!(slot.post(8));
        assert!(slot.post(9));
        assert!(slot.post(10));
        assert_eq!(slot.take(), Some(10));
        assert!(!slot.has_update());
        // Slots keep rotating correctly.
        for i in 0..10 {
            assert!(!slot.post(i));
            assert!(slot.post(i + 100));
            assert_eq!(slot.take(), Some(i + 100));
        }
    }

    #[test]
    fn replaced_and_remaining_values_are_dropped() {
        use std::rc::Rc;
        let marker = Rc::new(());
        {
            let slot: LatestSlot<Rc<()>> = LatestSlot::new();
            for _ in 0..5 {
                slot.post(marker.clone());
            }
            // One waiting value plus at most one stale value in the back slot.
            assert!(Rc::strong_count(&marker) <= 3);
            drop(slot.take());
            slot.post(marker.clone());
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn cross_thread_latest_wins() {
        use std::sync::Arc;
        let slot: Arc<LatestSlot<u32>> = Arc::new(LatestSlot::new());
        let producer = {
            let slot = slot.clone();
            std::thread::spawn(move || {
                for v in 0..1000 {
                    slot.post(v);
                }
            })
        };
        let mut last = None;
        while last != Some(999) {
            if let Some(v) = slot.take() {
                if let Some(prev) = last {
                    assert!(v > prev, "went backwards: {prev} then {v}");
                }
                last = Some(v);
            }
        }
        producer.join().unwrap();
    }
}
