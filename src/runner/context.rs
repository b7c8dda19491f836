use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::session::Session;
use super::wait::{OutcomeSet, WaitOutcome};
use crate::driver::{Locator, PageDriver};
use crate::error::HarnessError;
use crate::utils::config::Config;

/// Where the fixture credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Registered,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub source: CredentialSource,
}

/// Data a fixture step hands to the scenarios of its group
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub credentials: Option<Credentials>,
}

/// Execution context threaded through one group's scenarios
pub struct ScenarioContext<'a> {
    pub config: &'a Config,
    pub session: &'a Session,
    pub fixtures: Fixtures,
    /// Unix time at group start; keeps generated accounts unique per run
    pub stamp: i64,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(config: &'a Config, session: &'a Session) -> Self {
        Self {
            config,
            session,
            fixtures: Fixtures::default(),
            stamp: chrono::Utc::now().timestamp(),
        }
    }

    /// The session's main tab
    pub fn page(&self) -> Arc<dyn PageDriver> {
        self.session.page()
    }

    /// Navigate `page` to `url` and wait for `marker`
    pub async fn load(&self, page: &dyn PageDriver, url: &str, marker: &Locator) -> Result<()> {
        page.goto(url).await?;
        if self.session.wait.until_present(page, marker).await {
            Ok(())
        } else {
            Err(HarnessError::PageNotReady {
                url: url.to_string(),
                marker: marker.to_string(),
                timeout_ms: self.session.wait.timeout_ms,
            }
            .into())
        }
    }

    pub async fn wait_for(&self, page: &dyn PageDriver, set: &OutcomeSet) -> WaitOutcome {
        self.session.wait.for_outcome(page, set).await
    }

    pub async fn wait_for_within(
        &self,
        page: &dyn PageDriver,
        set: &OutcomeSet,
        timeout_ms: u64,
    ) -> WaitOutcome {
        self.session
            .wait
            .with_timeout(timeout_ms)
            .for_outcome(page, set)
            .await
    }

    /// Screenshot the main tab
    pub async fn capture(&self, label: &str) -> Option<PathBuf> {
        let page = self.page();
        self.session.evidence.capture(page.as_ref(), label).await
    }

    /// Another tab sharing cookies with the main one
    pub async fn open_tab(&self) -> Result<Arc<dyn PageDriver>> {
        self.session.browser().open_tab().await
    }

    /// A tab in a separate browser session
    pub async fn open_isolated(&self) -> Result<Arc<dyn PageDriver>> {
        self.session.browser().open_isolated().await
    }

    pub async fn pause(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}
