// Recognition events and the bounded result channel
//
// The detection loop publishes events here and the orchestrator drains them.
// The channel is deliberately shallow: in a live pipeline a stale or
// duplicate event is worse than a dropped one, so `send` never blocks the
// producer and overflow discards the newest event.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Depth of the result queue between the detection loop and the consumer
pub const RESULT_QUEUE_DEPTH: usize = 3;

/// A discrete recognition event emitted by the detection loop.
///
/// Immutable once produced; ownership moves into the channel and then to the
/// receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecognitionEvent {
    /// The wake word was detected (or a manual trigger was consumed)
    WakeDetected,
    /// A command phrase was recognized; carries the top-ranked command id
    CommandDetected { command_id: i32 },
    /// The command window closed without a recognized phrase
    Timeout,
    /// The pipeline reported an unrecoverable detection fault
    Error,
}

/// Sending half of the result channel, cloned into the detection loop.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<RecognitionEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Enqueue an event without blocking. If the queue is full the event is
    /// dropped and counted.
    pub fn send(&self, event: RecognitionEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.tx.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("result queue full, dropping event: {:?}", event);
        }
    }
}

/// Bounded FIFO of recognition events.
pub struct ResultChannel {
    tx: mpsc::Sender<RecognitionEvent>,
    rx: Mutex<mpsc::Receiver<RecognitionEvent>>,
    dropped: Arc<AtomicU64>,
}

impl ResultChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(RESULT_QUEUE_DEPTH);
        Self {
            tx,
            rx: Mutex::new(rx),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle for the producing side.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Receive the next event, waiting at most `timeout`. A zero timeout
    /// polls the queue without waiting. Returns `None` on expiry.
    pub async fn receive(&self, timeout: Duration) -> Option<RecognitionEvent> {
        let mut rx = self.rx.lock().await;
        if timeout.is_zero() {
            return rx.try_recv().ok();
        }
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(event) => event,
            Err(_) => None,
        }
    }

    /// Number of events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for ResultChannel {
    fn default() -> Self {
        Self::new()
    }
}
