//! Bounded waits for asynchronous page-state changes.
//!
//! A wait polls a set of terminal conditions at a fixed interval and stops at
//! the first one that holds. Timing out is not an error: the caller inspects
//! the page afterwards and classifies whatever state it finds.

use log::{debug, warn};

use crate::driver::common::{poll_until, PollConfig};
use crate::driver::{Locator, PageDriver};
use crate::utils::config::Config;

/// A page-state predicate whose truth ends a wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitCondition {
    UrlContains(String),
    UrlEquals(String),
    Present(Locator),
}

impl WaitCondition {
    /// Evaluate once. Driver errors count as "not yet".
    pub async fn is_met(&self, page: &dyn PageDriver) -> bool {
        match self {
            WaitCondition::UrlContains(fragment) => page
                .current_url()
                .await
                .map(|url| url.contains(fragment.as_str()))
                .unwrap_or(false),
            WaitCondition::UrlEquals(expected) => page
                .current_url()
                .await
                .map(|url| url == *expected)
                .unwrap_or(false),
            WaitCondition::Present(locator) => page.is_present(locator).await.unwrap_or(false),
        }
    }
}

/// Named any-of condition set
#[derive(Debug, Clone)]
pub struct OutcomeSet {
    pub label: &'static str,
    pub conditions: Vec<WaitCondition>,
}

const RESULT_TEXTS: [&str; 4] = ["sign in", "error", "already been registered", "⚠️"];

impl OutcomeSet {
    /// Registration submit resolved: success redirect or any result message
    pub fn registration() -> Self {
        let mut conditions = vec![WaitCondition::UrlContains(
            "/login.jsp?register=success".to_string(),
        )];
        conditions.extend(
            RESULT_TEXTS
                .iter()
                .map(|t| WaitCondition::Present(Locator::text(t))),
        );
        Self {
            label: "registration result",
            conditions,
        }
    }

    /// Login submit resolved: landing page or any result message
    pub fn sign_in() -> Self {
        let mut conditions = vec![WaitCondition::UrlContains("/welcome.jsp".to_string())];
        conditions.extend(
            RESULT_TEXTS
                .iter()
                .map(|t| WaitCondition::Present(Locator::text(t))),
        );
        Self {
            label: "sign-in result",
            conditions,
        }
    }

    /// Login submit resolved in the lockout scenarios
    pub fn lockout(welcome_url: &str) -> Self {
        Self {
            label: "login result",
            conditions: vec![
                WaitCondition::UrlEquals(welcome_url.to_string()),
                WaitCondition::Present(Locator::XPath(
                    "//div[contains(@class,'error-message') or contains(text(),'Incorrect') or contains(text(),'locked')]"
                        .to_string(),
                )),
                WaitCondition::Present(Locator::XPath(
                    "//*[contains(text(),'Invalid credentials') or contains(text(),'too many')]"
                        .to_string(),
                )),
            ],
        }
    }
}

/// Result of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Index of the condition that held first
    Met(usize),
    TimedOut,
}

impl WaitOutcome {
    pub fn is_met(self) -> bool {
        matches!(self, WaitOutcome::Met(_))
    }
}

/// Wait helper with a fixed timeout and polling interval
#[derive(Debug, Clone, Copy)]
pub struct BoundedWait {
    pub timeout_ms: u64,
    pub poll_ms: u64,
}

impl BoundedWait {
    pub fn new(timeout_ms: u64, poll_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_ms,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_timeout_ms, config.poll_interval_ms)
    }

    pub fn with_timeout(self, timeout_ms: u64) -> Self {
        Self { timeout_ms, ..self }
    }

    fn poll_config(&self) -> PollConfig {
        PollConfig::fixed(self.timeout_ms, self.poll_ms)
    }

    /// Block until one of `conditions` holds or the timeout elapses
    pub async fn until_any(
        &self,
        page: &dyn PageDriver,
        conditions: &[WaitCondition],
    ) -> WaitOutcome {
        let found = poll_until(|| first_met(page, conditions), self.poll_config()).await;
        match found {
            Some(index) => WaitOutcome::Met(index),
            None => WaitOutcome::TimedOut,
        }
    }

    /// Wait for a named outcome set; a timeout is logged, never raised
    pub async fn for_outcome(&self, page: &dyn PageDriver, set: &OutcomeSet) -> WaitOutcome {
        let outcome = self.until_any(page, &set.conditions).await;
        match outcome {
            WaitOutcome::Met(i) => debug!("Waiting for {}: condition #{} met", set.label, i),
            WaitOutcome::TimedOut => warn!("Waiting for {} timed out", set.label),
        }
        outcome
    }

    pub async fn until_present(&self, page: &dyn PageDriver, locator: &Locator) -> bool {
        let conditions = [WaitCondition::Present(locator.clone())];
        self.until_any(page, &conditions).await.is_met()
    }
}

async fn first_met(page: &dyn PageDriver, conditions: &[WaitCondition]) -> Option<usize> {
    for (i, condition) in conditions.iter().enumerate() {
        if condition.is_met(page).await {
            return Some(i);
        }
    }
    None
}
