// Development stand-in recognizer
//
// Reports Detecting until its inactivity budget is exhausted, then TimedOut.
// Useful for running the pipeline end to end without a command model: wake
// triggers open the command window and the window closes by timeout.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{CommandCandidate, CommandRecognizer, RecognizerFactory, RecognizerState};

/// Frame duration assumed when converting the timeout into a frame budget
/// (512 samples at 16 kHz)
const FRAME_MS: u64 = 32;

pub struct MockRecognizer {
    model: String,
    frames_left: u64,
}

impl MockRecognizer {
    pub fn new(model: &str, timeout: Duration) -> Self {
        let budget = (timeout.as_millis() as u64 / FRAME_MS).max(1);
        debug!(
            "Mock recognizer created: model={} budget={} frames",
            model, budget
        );
        Self {
            model: model.to_string(),
            frames_left: budget,
        }
    }
}

#[async_trait]
impl CommandRecognizer for MockRecognizer {
    async fn detect(&mut self, _frame: &[i16]) -> Result<RecognizerState> {
        if self.frames_left == 0 {
            return Ok(RecognizerState::TimedOut);
        }
        self.frames_left -= 1;
        if self.frames_left == 0 {
            debug!("Mock recognizer timed out: model={}", self.model);
            Ok(RecognizerState::TimedOut)
        } else {
            Ok(RecognizerState::Detecting)
        }
    }

    fn results(&self) -> Vec<CommandCandidate> {
        Vec::new()
    }
}

/// Factory producing [`MockRecognizer`]s.
pub struct MockRecognizerFactory;

impl RecognizerFactory for MockRecognizerFactory {
    fn create(&self, model: &str, timeout: Duration) -> Result<Box<dyn CommandRecognizer>> {
        Ok(Box::new(MockRecognizer::new(model, timeout)))
    }
}
