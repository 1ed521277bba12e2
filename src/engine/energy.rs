// Energy-threshold reference engine
//
// A development stand-in for the production wake-word/VAD models: frames are
// scored by RMS amplitude on the first microphone channel. Wake triggers when
// wake scoring is enabled and the RMS crosses the wake threshold; the VAD flag
// is a plain energy gate. Fetch results queue up behind feed so the two loops
// can run at their own pace.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info};

use super::{DetectionEngine, FetchResult, VadState, WakeState, ENGINE_CHANNELS};

/// Most results the engine buffers before discarding the oldest
const FETCH_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct EnergyEngineConfig {
    /// Samples per channel per feed call
    pub chunk_size: usize,
    /// RMS amplitude (raw i16 units) above which a frame counts as speech
    pub vad_rms_threshold: f32,
    /// RMS amplitude above which an enabled wake detector triggers
    pub wake_rms_threshold: f32,
    /// How long `fetch` waits for a frame before giving up for the cycle
    pub fetch_wait: Duration,
}

impl Default for EnergyEngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            vad_rms_threshold: 500.0,
            wake_rms_threshold: 8000.0,
            fetch_wait: Duration::from_millis(100),
        }
    }
}

struct EngineInner {
    wake_enabled: bool,
    wake_model: Option<String>,
    queue: VecDeque<FetchResult>,
}

pub struct EnergyEngine {
    config: EnergyEngineConfig,
    inner: Mutex<EngineInner>,
    ready: Notify,
}

impl EnergyEngine {
    pub fn new(config: EnergyEngineConfig) -> Self {
        info!(
            "Energy engine initialized: chunk={} vad_rms={} wake_rms={}",
            config.chunk_size, config.vad_rms_threshold, config.wake_rms_threshold
        );
        Self {
            config,
            inner: Mutex::new(EngineInner {
                wake_enabled: true,
                wake_model: None,
                queue: VecDeque::new(),
            }),
            ready: Notify::new(),
        }
    }
}

/// RMS amplitude of channel 0 in a 3-channel interleaved frame
fn channel0_rms(frame: &[i16]) -> f32 {
    let samples = frame.len() / ENGINE_CHANNELS;
    if samples == 0 {
        return 0.0;
    }
    let energy: f64 = (0..samples)
        .map(|i| {
            let s = frame[i * ENGINE_CHANNELS] as f64;
            s * s
        })
        .sum();
    (energy / samples as f64).sqrt() as f32
}

#[async_trait]
impl DetectionEngine for EnergyEngine {
    fn feed_chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    async fn feed(&self, frame: &[i16]) {
        let rms = channel0_rms(frame);
        let vad_state = if rms > self.config.vad_rms_threshold {
            VadState::Speech
        } else {
            VadState::Silence
        };

        let mut inner = self.inner.lock().await;
        let wake_state = if inner.wake_enabled && rms > self.config.wake_rms_threshold {
            WakeState::Triggered
        } else {
            WakeState::Quiet
        };

        let samples = frame.len() / ENGINE_CHANNELS;
        let mono: Vec<i16> = (0..samples).map(|i| frame[i * ENGINE_CHANNELS]).collect();

        if inner.queue.len() >= FETCH_QUEUE_DEPTH {
            inner.queue.pop_front();
            debug!("fetch queue full, discarding oldest frame");
        }
        inner.queue.push_back(FetchResult {
            wake_state,
            vad_state,
            trigger_channel: 0,
            frame: mono,
        });
        drop(inner);
        self.ready.notify_one();
    }

    async fn fetch(&self) -> Option<FetchResult> {
        let deadline = Instant::now() + self.config.fetch_wait;
        loop {
            if let Some(res) = self.inner.lock().await.queue.pop_front() {
                return Some(res);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let _ = tokio::time::timeout_at(deadline, self.ready.notified()).await;
        }
    }

    async fn enable_wake(&self) {
        self.inner.lock().await.wake_enabled = true;
    }

    async fn disable_wake(&self) {
        self.inner.lock().await.wake_enabled = false;
    }

    async fn set_wake_model(&self, model: &str) -> Result<()> {
        if model.is_empty() {
            bail!("wake model name is empty");
        }
        info!("Energy engine wake model set: {}", model);
        self.inner.lock().await.wake_model = Some(model.to_string());
        Ok(())
    }
}
