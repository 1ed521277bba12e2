// Detection loop
//
// Real-time consumer half of the pipeline: drives the wake -> command state
// machine over frames fetched from the detection engine and publishes
// recognition events. In Listening, frames are scored only for wake-word
// presence; a trigger (engine-reported or manual) opens the command window,
// where frames go to the command recognizer under a VAD-driven silence
// counter. The window closes on a recognized command, on the recognizer's own
// inactivity timeout, or when the silence run is exhausted.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::engine::{DetectionEngine, VadState, WakeState};
use crate::events::{EventSender, RecognitionEvent};
use crate::recognizer::{CommandRecognizer, RecognizerState};
use crate::session::signal::{Teardown, TriggerSlot};

/// Consecutive unchanged-VAD frames that close the command window.
///
/// The comparison is exact equality on purpose: a VAD flip at the threshold
/// frame restarts the run from zero.
const SILENCE_FRAME_LIMIT: u32 = 100;

/// Tracks the run of consecutive frames with an unchanged VAD verdict.
///
/// The previous verdict persists across command windows (only the run counter
/// resets on wake) and starts out as silence.
pub(crate) struct SilenceRun {
    last: VadState,
    run: u32,
}

impl SilenceRun {
    pub fn new() -> Self {
        Self {
            last: VadState::Silence,
            run: 0,
        }
    }

    /// Reset the run counter on entry to a command window.
    pub fn restart(&mut self) {
        self.run = 0;
    }

    /// Account for one frame. Returns true when the run hits the limit on an
    /// exact frame boundary while the verdict is silence.
    pub fn update(&mut self, vad: VadState) -> bool {
        if vad != self.last {
            self.last = vad;
            self.run = 0;
            return false;
        }
        self.run += 1;
        self.run == SILENCE_FRAME_LIMIT && vad == VadState::Silence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Listening,
    CommandActive,
}

pub(crate) struct DetectContext {
    pub engine: Arc<dyn DetectionEngine>,
    pub recognizer: Arc<Mutex<Option<Box<dyn CommandRecognizer>>>>,
    pub events: EventSender,
    pub trigger: Arc<TriggerSlot>,
    pub teardown: Arc<Teardown>,
}

pub(crate) async fn run_detect_loop(ctx: DetectContext) {
    info!("Detection loop started");

    let mut phase = Phase::Listening;
    let mut silence = SilenceRun::new();

    loop {
        if ctx.teardown.is_requested() {
            break;
        }

        // A cycle with nothing to fetch is not fatal; try again.
        let Some(res) = ctx.engine.fetch().await else {
            continue;
        };

        match phase {
            Phase::Listening => {
                let manual = ctx.trigger.take();
                if res.wake_state == WakeState::Triggered || manual {
                    if manual {
                        info!("Manual trigger consumed, opening command window");
                    } else {
                        info!(
                            "Wake word detected, trigger channel: {}",
                            res.trigger_channel
                        );
                    }
                    ctx.events.send(RecognitionEvent::WakeDetected);
                    silence.restart();
                    ctx.engine.disable_wake().await;
                    phase = Phase::CommandActive;
                }
            }
            Phase::CommandActive => {
                let mut slot = ctx.recognizer.lock().await;
                let Some(rec) = slot.as_mut() else {
                    drop(slot);
                    // Fail soft: no event, surfaced via log only.
                    warn!("Command recognizer not initialized, abandoning command window");
                    ctx.engine.enable_wake().await;
                    phase = Phase::Listening;
                    continue;
                };

                match rec.detect(&res.frame).await {
                    Ok(RecognizerState::Detected) => {
                        let candidates = rec.results();
                        drop(slot);
                        for c in &candidates {
                            info!(
                                "Command candidate: id={} phrase={} prob={:.3}",
                                c.command_id, c.phrase_id, c.prob
                            );
                        }
                        // The event must be queued before wake scoring resumes.
                        match candidates.first() {
                            Some(top) => ctx.events.send(RecognitionEvent::CommandDetected {
                                command_id: top.command_id,
                            }),
                            None => warn!("Recognizer reported a detection with no candidates"),
                        }
                        ctx.engine.enable_wake().await;
                        phase = Phase::Listening;
                        continue;
                    }
                    Ok(RecognizerState::TimedOut) => {
                        drop(slot);
                        warn!("Command recognizer timed out");
                        ctx.events.send(RecognitionEvent::Timeout);
                        ctx.engine.enable_wake().await;
                        phase = Phase::Listening;
                        continue;
                    }
                    Ok(RecognizerState::Detecting) => {
                        drop(slot);
                    }
                    Err(e) => {
                        drop(slot);
                        // Transient recognizer failure: skip this frame.
                        warn!("Recognizer failed on frame, skipping: {:#}", e);
                        continue;
                    }
                }

                if silence.update(res.vad_state) {
                    info!("Silence run exhausted, closing command window");
                    ctx.events.send(RecognitionEvent::Timeout);
                    ctx.engine.enable_wake().await;
                    phase = Phase::Listening;
                }
            }
        }
    }

    ctx.teardown.mark_detect_finished();
    info!("Detection loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_run_hits_limit_exactly() {
        let mut run = SilenceRun::new();
        run.restart();
        for i in 1..SILENCE_FRAME_LIMIT {
            assert!(!run.update(VadState::Silence), "fired early at frame {}", i);
        }
        assert!(run.update(VadState::Silence));
    }

    #[test]
    fn test_speech_run_never_fires() {
        let mut run = SilenceRun::new();
        run.restart();
        // First speech frame flips the tracked state, then a long unchanged
        // speech run passes the limit without firing.
        assert!(!run.update(VadState::Speech));
        for _ in 0..2 * SILENCE_FRAME_LIMIT {
            assert!(!run.update(VadState::Speech));
        }
    }

    #[test]
    fn test_flip_at_limit_restarts_run() {
        let mut run = SilenceRun::new();
        run.restart();
        for _ in 1..SILENCE_FRAME_LIMIT {
            assert!(!run.update(VadState::Silence));
        }
        // Flip on the frame that would have fired: the run restarts and a
        // full limit of unchanged silence frames is needed again.
        assert!(!run.update(VadState::Speech));
        assert!(!run.update(VadState::Silence));
        for _ in 1..SILENCE_FRAME_LIMIT {
            assert!(!run.update(VadState::Silence));
        }
        assert!(run.update(VadState::Silence));
    }

    #[test]
    fn test_restart_keeps_last_state() {
        let mut run = SilenceRun::new();
        run.restart();
        for _ in 0..10 {
            run.update(VadState::Silence);
        }
        // A new command window resets only the counter; the unchanged
        // silence verdict keeps counting from zero without a flip.
        run.restart();
        for _ in 1..SILENCE_FRAME_LIMIT {
            assert!(!run.update(VadState::Silence));
        }
        assert!(run.update(VadState::Silence));
    }
}
