//! Command recognizer interface
//!
//! Scores cleaned frames against a command-phrase model during the window
//! that follows a wake trigger. The recognizer keeps its own inactivity
//! timeout, independent of the detection loop's silence counter.

pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use mock::{MockRecognizer, MockRecognizerFactory};

/// Per-frame recognizer verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    /// Still accumulating audio
    Detecting,
    /// A command phrase was recognized; results are ready
    Detected,
    /// The recognizer's internal inactivity bound elapsed
    TimedOut,
}

/// One ranked command candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CommandCandidate {
    pub command_id: i32,
    pub phrase_id: i32,
    pub prob: f32,
}

/// Opaque command-phrase recognizer bound to one loaded model.
#[async_trait]
pub trait CommandRecognizer: Send {
    /// Score one cleaned frame.
    async fn detect(&mut self, frame: &[i16]) -> Result<RecognizerState>;

    /// Ranked candidates for the most recent `Detected` verdict, best first.
    /// The internal ranking is trusted as-is; callers do not re-rank.
    fn results(&self) -> Vec<CommandCandidate>;
}

/// Creates recognizers from a named model. The session uses this at start and
/// keeps it for later language switches.
pub trait RecognizerFactory: Send + Sync {
    fn create(&self, model: &str, timeout: Duration) -> Result<Box<dyn CommandRecognizer>>;
}
