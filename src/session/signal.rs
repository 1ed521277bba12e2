// Cross-task signaling for the pipeline lifecycle
//
// Two single-slot primitives cover all cross-thread mutable state outside the
// result channel: the teardown signal (one writer, two readers) and the
// manual-trigger slot (one external writer, one consumer in the detection
// loop).

use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown request plus per-loop completion bits.
///
/// Both loops poll `is_requested` once per iteration and publish their
/// completion bit on the way out; the controlling task must observe both bits
/// before releasing any resource the loops may still be touching.
pub struct Teardown {
    requested: AtomicBool,
    feed_finished: AtomicBool,
    detect_finished: AtomicBool,
}

impl Teardown {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            feed_finished: AtomicBool::new(false),
            detect_finished: AtomicBool::new(false),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn mark_feed_finished(&self) {
        self.feed_finished.store(true, Ordering::SeqCst);
    }

    pub fn mark_detect_finished(&self) {
        self.detect_finished.store(true, Ordering::SeqCst);
    }

    pub fn loops_finished(&self) -> bool {
        self.feed_finished.load(Ordering::SeqCst) && self.detect_finished.load(Ordering::SeqCst)
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-slot pending manual-trigger request: at most one outstanding.
///
/// Arming an already-armed slot is a no-op, so concurrent requests can never
/// produce duplicate synthetic wake events.
pub struct TriggerSlot {
    pending: AtomicBool,
}

impl TriggerSlot {
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Arm the slot. Returns false if a request was already pending.
    pub fn arm(&self) -> bool {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Consume the pending request, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

impl Default for TriggerSlot {
    fn default() -> Self {
        Self::new()
    }
}
