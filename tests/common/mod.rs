// Scripted collaborators for pipeline integration tests.
//
// The engine, recognizer, source and sink here are driven entirely by the
// tests: frames are pushed into the engine by hand, so event ordering is
// deterministic regardless of task scheduling.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use hark::{
    AudioSource, CommandCandidate, CommandRecognizer, DetectionEngine, FetchResult,
    RecognizerFactory, RecognizerState, RecordingSink, VadState, WakeState,
};

/// Chunk size used by the scripted engine
pub const CHUNK: usize = 4;

/// One live session per process: tests in a binary share this lock.
pub fn session_lock() -> &'static tokio::sync::Mutex<()> {
    static LOCK: OnceLock<tokio::sync::Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| tokio::sync::Mutex::new(()))
}

pub fn trigger_frame() -> FetchResult {
    FetchResult {
        wake_state: WakeState::Triggered,
        vad_state: VadState::Speech,
        trigger_channel: 0,
        frame: vec![1000; CHUNK],
    }
}

pub fn silence_frame() -> FetchResult {
    FetchResult {
        wake_state: WakeState::Quiet,
        vad_state: VadState::Silence,
        trigger_channel: 0,
        frame: vec![0; CHUNK],
    }
}

pub fn speech_frame() -> FetchResult {
    FetchResult {
        wake_state: WakeState::Quiet,
        vad_state: VadState::Speech,
        trigger_channel: 0,
        frame: vec![500; CHUNK],
    }
}

/// Engine whose fetch results are pushed by the test.
pub struct ScriptedEngine {
    queue: Mutex<VecDeque<FetchResult>>,
    enable_calls: AtomicUsize,
    disable_calls: AtomicUsize,
    wake_models: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
            wake_models: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, res: FetchResult) {
        self.queue.lock().unwrap().push_back(res);
    }

    pub fn push_many(&self, n: usize, res: FetchResult) {
        let mut queue = self.queue.lock().unwrap();
        for _ in 0..n {
            queue.push_back(res.clone());
        }
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disable_calls(&self) -> usize {
        self.disable_calls.load(Ordering::SeqCst)
    }

    pub fn wake_models(&self) -> Vec<String> {
        self.wake_models.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetectionEngine for ScriptedEngine {
    fn feed_chunk_size(&self) -> usize {
        CHUNK
    }

    async fn feed(&self, _frame: &[i16]) {}

    async fn fetch(&self) -> Option<FetchResult> {
        let popped = self.queue.lock().unwrap().pop_front();
        if popped.is_none() {
            // Keep the detect loop polling without spinning hot.
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        popped
    }

    async fn enable_wake(&self) {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn disable_wake(&self) {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn set_wake_model(&self, model: &str) -> Result<()> {
        self.wake_models.lock().unwrap().push(model.to_string());
        Ok(())
    }
}

/// Recognizer that replays a fixed verdict script, then keeps Detecting.
/// The first `errors` detect calls fail, exercising frame-skip recovery.
pub struct ScriptedRecognizer {
    script: VecDeque<RecognizerState>,
    candidates: Vec<CommandCandidate>,
    errors: usize,
}

#[async_trait]
impl CommandRecognizer for ScriptedRecognizer {
    async fn detect(&mut self, _frame: &[i16]) -> Result<RecognizerState> {
        if self.errors > 0 {
            self.errors -= 1;
            bail!("transient recognizer failure");
        }
        Ok(self.script.pop_front().unwrap_or(RecognizerState::Detecting))
    }

    fn results(&self) -> Vec<CommandCandidate> {
        self.candidates.clone()
    }
}

pub struct ScriptedRecognizerFactory {
    pub states: Vec<RecognizerState>,
    pub candidates: Vec<CommandCandidate>,
    pub errors: usize,
}

impl ScriptedRecognizerFactory {
    /// Recognizer that never concludes; the loop's silence counter decides.
    pub fn detecting() -> Self {
        Self {
            states: Vec::new(),
            candidates: Vec::new(),
            errors: 0,
        }
    }
}

impl RecognizerFactory for ScriptedRecognizerFactory {
    fn create(&self, _model: &str, _timeout: Duration) -> Result<Box<dyn CommandRecognizer>> {
        Ok(Box::new(ScriptedRecognizer {
            script: self.states.clone().into(),
            candidates: self.candidates.clone(),
            errors: self.errors,
        }))
    }
}

/// Factory that always fails, for start-rollback tests.
pub struct FailingRecognizerFactory;

impl RecognizerFactory for FailingRecognizerFactory {
    fn create(&self, model: &str, _timeout: Duration) -> Result<Box<dyn CommandRecognizer>> {
        bail!("recognizer model '{}' failed to load", model)
    }
}

/// Source delivering zeroed capture frames forever.
pub struct SilentSource;

#[async_trait]
impl AudioSource for SilentSource {
    async fn read(&mut self, buf: &mut [i16], _timeout: Duration) -> Result<usize> {
        buf.fill(0);
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(buf.len())
    }
}

/// Source replaying fixed capture chunks, then empty reads.
pub struct PatternSource {
    chunks: VecDeque<Vec<i16>>,
}

impl PatternSource {
    pub fn new(chunks: Vec<Vec<i16>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

#[async_trait]
impl AudioSource for PatternSource {
    async fn read(&mut self, buf: &mut [i16], _timeout: Duration) -> Result<usize> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(0)
            }
        }
    }
}

/// Sink capturing everything saved to it.
#[derive(Clone)]
pub struct MemorySink {
    pub samples: Arc<Mutex<Vec<i16>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn recorded(&self) -> Vec<i16> {
        self.samples.lock().unwrap().clone()
    }
}

impl RecordingSink for MemorySink {
    fn save(&mut self, samples: &[i16]) -> Result<()> {
        self.samples.lock().unwrap().extend_from_slice(samples);
        Ok(())
    }
}
