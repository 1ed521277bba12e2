use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::Language;

/// Configuration for a recognition session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier, used in logs and stats
    pub session_id: String,

    /// Language the wake and command models are resolved for
    pub language: Language,

    /// Inactivity bound handed to the command recognizer at creation
    pub recognizer_timeout: Duration,

    /// Upper bound for one blocking device read in the feed loop
    pub device_read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            language: Language::English,
            recognizer_timeout: Duration::from_secs(6),
            device_read_timeout: Duration::from_secs(1),
        }
    }
}
