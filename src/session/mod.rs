//! Recognition session management
//!
//! This module provides the `Session` abstraction that owns the
//! capture-detect-dispatch pipeline:
//! - The audio feed loop (capture -> channel remap -> engine)
//! - The detection loop (wake -> command state machine -> events)
//! - The bounded result channel the orchestrator drains
//! - Synchronized teardown of both loops before resource release

mod config;
mod detect;
mod session;
pub(crate) mod signal;
pub(crate) mod stats;

pub use config::SessionConfig;
pub use session::{Session, SessionDeps};
pub use stats::SessionStats;
