// Model registry and language selection
//
// Wake-word and command models are opaque artifacts addressed by name. The
// registry answers pure first-match lookups by name prefix and qualifier;
// no fallback chain exists, so an absent model is an initialization error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name prefix for wake-word models
pub const WAKE_MODEL_PREFIX: &str = "wn";

/// Name prefix for command-recognizer models
pub const COMMAND_MODEL_PREFIX: &str = "mn";

/// Supported recognition languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// Qualifier substring used to select models for this language
    pub fn qualifier(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "cn",
        }
    }
}

/// Resolves model names by prefix and qualifier.
pub trait ModelRegistry: Send + Sync {
    /// First model name starting with `prefix` and containing `qualifier`.
    /// An empty qualifier matches any model with the prefix.
    fn filter(&self, prefix: &str, qualifier: &str) -> Option<String>;
}

/// Registry backed by a directory of model files.
///
/// Model names are the file stems, scanned once and kept in sorted order so
/// that "first match" is deterministic.
pub struct DirRegistry {
    names: Vec<String>,
}

impl DirRegistry {
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut names = Vec::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read model directory: {}", dir.display()))?;
        for entry in entries {
            let entry = entry.context("failed to read model directory entry")?;
            let path: PathBuf = entry.path();
            if path.is_file() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();

        info!(
            "Model registry loaded: {} models from {}",
            names.len(),
            dir.display()
        );

        Ok(Self { names })
    }

    /// Registry over a fixed list of model names (used by tests and demos).
    pub fn from_names(mut names: Vec<String>) -> Self {
        names.sort();
        Self { names }
    }
}

impl ModelRegistry for DirRegistry {
    fn filter(&self, prefix: &str, qualifier: &str) -> Option<String> {
        self.names
            .iter()
            .find(|name| name.starts_with(prefix) && name.contains(qualifier))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DirRegistry {
        DirRegistry::from_names(vec![
            "wn9_alexa_en".to_string(),
            "wn9_nihao_cn".to_string(),
            "mn6_en".to_string(),
            "mn6_cn".to_string(),
        ])
    }

    #[test]
    fn test_filter_by_prefix_and_qualifier() {
        let reg = registry();
        assert_eq!(
            reg.filter(WAKE_MODEL_PREFIX, "en"),
            Some("wn9_alexa_en".to_string())
        );
        assert_eq!(
            reg.filter(COMMAND_MODEL_PREFIX, "cn"),
            Some("mn6_cn".to_string())
        );
    }

    #[test]
    fn test_empty_qualifier_matches_first() {
        let reg = registry();
        // Sorted order makes "first match" deterministic.
        assert_eq!(
            reg.filter(COMMAND_MODEL_PREFIX, ""),
            Some("mn6_cn".to_string())
        );
    }

    #[test]
    fn test_absent_model_is_none() {
        let reg = registry();
        assert_eq!(reg.filter("tts", ""), None);
        assert_eq!(reg.filter(WAKE_MODEL_PREFIX, "de"), None);
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wn9_alexa_en.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("mn6_en.bin"), b"x").unwrap();

        let reg = DirRegistry::scan(dir.path()).unwrap();
        assert_eq!(
            reg.filter(WAKE_MODEL_PREFIX, "en"),
            Some("wn9_alexa_en".to_string())
        );
        assert_eq!(reg.filter(COMMAND_MODEL_PREFIX, "en"), Some("mn6_en".to_string()));
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        assert!(DirRegistry::scan("/nonexistent/model/dir").is_err());
    }

    #[test]
    fn test_language_qualifiers() {
        assert_eq!(Language::English.qualifier(), "en");
        assert_eq!(Language::Chinese.qualifier(), "cn");
    }
}
