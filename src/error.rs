//! Error types for the voice-command pipeline

use thiserror::Error;

/// Result type alias for session-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the session lifecycle API.
///
/// Frame-level runtime failures (a failed device read, an engine fetch that
/// returns nothing, a transient recognizer error) are recovered inside the
/// loops and never reach the caller; only lifecycle misuse and startup
/// failures do.
#[derive(Debug, Error)]
pub enum Error {
    /// Lifecycle call made out of order (e.g. start while a session is live)
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Allocation or collaborator creation failed during start
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[source] anyhow::Error),

    /// The model registry has no entry for the requested prefix/qualifier
    #[error("no model found for prefix '{prefix}' qualifier '{qualifier}'")]
    ModelNotFound { prefix: String, qualifier: String },

    /// The pipeline loops did not acknowledge teardown within the wait bound
    #[error("timed out waiting for pipeline loops to finish")]
    ShutdownTimeout,
}
