//! Polling utilities shared by wait strategies

use std::future::Future;
use std::time::{Duration, Instant};

/// Configuration for polling operations
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl PollConfig {
    /// Poll at a constant interval
    pub fn fixed(timeout_ms: u64, interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            interval_ms,
        }
    }
}

/// Calls `check_fn` until it yields `Some` or the timeout is reached.
///
/// The check always runs at least once.
pub async fn poll_until<T, F, Fut>(mut check_fn: F, config: PollConfig) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let interval = Duration::from_millis(config.interval_ms.max(1));

    loop {
        if let Some(value) = check_fn().await {
            return Some(value);
        }
        if start.elapsed() >= timeout {
            return None;
        }
        tokio::time::sleep(interval).await;
    }
}
