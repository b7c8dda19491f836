use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::wait::BoundedWait;
use crate::driver::{BrowserDriver, BrowserLauncher, LaunchOptions, PageDriver};
use crate::error::HarnessError;
use crate::report::EvidenceStore;
use crate::utils::config::Config;

/// Browser handle plus evidence folder, owned by one group run
pub struct Session {
    browser: Box<dyn BrowserDriver>,
    page: Arc<dyn PageDriver>,
    pub wait: BoundedWait,
    pub evidence: EvidenceStore,
    closed: AtomicBool,
}

impl Session {
    /// Launch a browser and prepare a fresh evidence folder. Not retried.
    pub async fn setup(
        launcher: &dyn BrowserLauncher,
        config: &Config,
    ) -> Result<Self, HarnessError> {
        let options = LaunchOptions {
            headless: config.headless,
            maximized: !config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
        };

        let browser = launcher.launch(&options).await.map_err(|e| {
            error!("Browser session failed to start: {:#}", e);
            HarnessError::SessionStart(format!("{:#}", e))
        })?;

        let evidence = match EvidenceStore::create(&config.output_dir) {
            Ok(store) => store,
            Err(e) => {
                error!("{:#}", e);
                if let Err(quit_err) = browser.quit().await {
                    warn!("Failed to close browser: {:#}", quit_err);
                }
                return Err(HarnessError::SessionStart(format!("{:#}", e)));
            }
        };

        info!("{} session initialized", browser.browser_name());
        Ok(Self {
            page: browser.main_page(),
            browser,
            wait: BoundedWait::from_config(config),
            evidence,
            closed: AtomicBool::new(false),
        })
    }

    pub fn page(&self) -> Arc<dyn PageDriver> {
        self.page.clone()
    }

    pub fn browser(&self) -> &dyn BrowserDriver {
        self.browser.as_ref()
    }

    /// Release the browser. Later calls do nothing.
    pub async fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.browser.quit().await {
            Ok(()) => info!("Browser session closed"),
            Err(e) => warn!("Failed to close browser session: {:#}", e),
        }
    }
}
