//! Detection engine interface
//!
//! The engine is an opaque capability wrapping the wake-word and
//! voice-activity models. The feed loop pushes 3-channel interleaved PCM into
//! it; the detection loop pulls per-frame results out. Exactly one task class
//! touches each side in normal operation.

pub mod energy;

use anyhow::Result;
use async_trait::async_trait;

pub use energy::{EnergyEngine, EnergyEngineConfig};

/// Number of interleaved channels the engine expects per frame
pub const ENGINE_CHANNELS: usize = 3;

/// Number of interleaved channels delivered by the capture device
pub const CAPTURE_CHANNELS: usize = 2;

/// Wake-word verdict for one fetched frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeState {
    /// No trigger this frame
    Quiet,
    /// The wake word was detected and verified on a channel
    Triggered,
}

/// Voice-activity verdict for one fetched frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    Silence,
    Speech,
}

/// One processed frame pulled from the engine.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub wake_state: WakeState,
    pub vad_state: VadState,
    /// Microphone channel the trigger was verified on
    pub trigger_channel: usize,
    /// Cleaned single-channel frame for the command recognizer
    pub frame: Vec<i16>,
}

/// Opaque wake-word/VAD engine, created and destroyed as a unit.
///
/// `fetch` must return within a bound on the order of the frame arrival rate;
/// `None` means "nothing usable this cycle" and the caller simply tries
/// again, so a slow engine never wedges cooperative cancellation.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    /// Samples per channel the engine wants in each `feed` call
    fn feed_chunk_size(&self) -> usize;

    /// Push one 3-channel interleaved frame of `feed_chunk_size()` samples
    /// per channel into the engine's internal buffer.
    async fn feed(&self, frame: &[i16]);

    /// Pull the next processed frame, or `None` if nothing is ready within
    /// the engine's internal wait bound.
    async fn fetch(&self) -> Option<FetchResult>;

    /// Resume scoring frames for wake-word presence.
    async fn enable_wake(&self);

    /// Stop scoring frames for wake-word presence (command window open).
    async fn disable_wake(&self);

    /// Load a different wake-word model on the live engine instance.
    async fn set_wake_model(&self, model: &str) -> Result<()>;
}
