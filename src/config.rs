use anyhow::Result;
use serde::Deserialize;

use crate::models::Language;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Upper bound for one device read, in milliseconds
    pub read_timeout_ms: u64,
    /// Directory recordings are written to
    pub record_dir: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            read_timeout_ms: 1000,
            record_dir: "recordings".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelsConfig {
    /// Directory scanned for wake and command model files
    pub dir: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: "models".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// Default recognition language
    pub language: Language,
    /// Command recognizer inactivity bound, in milliseconds
    pub recognizer_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            recognizer_timeout_ms: 6000,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus `HARK_*` environment
    /// overrides; all fields fall back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("HARK").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
