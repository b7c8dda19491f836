//! Harness-level failure kinds.

use std::path::PathBuf;
use thiserror::Error;

/// Errors the group runner and scenarios need to tell apart.
///
/// Driver calls return plain `anyhow` errors; these kinds are raised where a
/// caller branches on what went wrong.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to start browser session: {0}")]
    SessionStart(String),

    #[error("Page failed to load: {url} (marker '{marker}' not present after {timeout_ms}ms)")]
    PageNotReady {
        url: String,
        marker: String,
        timeout_ms: u64,
    },

    #[error("Element missing: {0}")]
    ElementMissing(String),

    #[error("Failed to write report {path}: {reason}")]
    Report { path: PathBuf, reason: String },
}

impl HarnessError {
    /// True when the failure comes from the environment rather than the target.
    pub fn is_environment(&self) -> bool {
        matches!(self, HarnessError::SessionStart(_))
    }
}
