use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::AtomicU64;

use crate::models::Language;

/// Live counters shared with the pipeline loops
pub(crate) struct SessionCounters {
    pub frames_fed: AtomicU64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self {
            frames_fed: AtomicU64::new(0),
        }
    }
}

/// Snapshot of a running session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Seconds since start
    pub duration_secs: f64,

    /// Currently selected language
    pub language: Language,

    /// Capture chunks fed to the detection engine
    pub frames_fed: u64,

    /// Events discarded because the result queue was full
    pub events_dropped: u64,
}
