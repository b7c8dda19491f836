//! Web Driver implementation using Playwright
//!
//! Drives a Chromium browser against the application under test.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use playwright::api::{Browser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::{BrowserDriver, BrowserLauncher, LaunchOptions, Locator, PageDriver};
use crate::error::HarnessError;

/// Launches a Chromium browser through Playwright
#[derive(Debug, Default, Clone, Copy)]
pub struct WebLauncher;

#[async_trait]
impl BrowserLauncher for WebLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserDriver>> {
        let driver = WebDriver::new(options.clone()).await?;
        Ok(Box::new(driver))
    }
}

/// Web Driver using Playwright
pub struct WebDriver {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Arc<Browser>,
    context: Arc<BrowserContext>,
    main: Arc<WebPage>,
    options: LaunchOptions,
}

impl WebDriver {
    /// Create a new WebDriver instance
    pub async fn new(options: LaunchOptions) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let chromium = playwright.chromium();
        let browser = launch_chromium_browser(&chromium, &options).await?;

        let context = browser
            .context_builder()
            .build()
            .await
            .context("Failed to create browser context")?;

        let page = context.new_page().await.context("Failed to open page")?;
        set_viewport(&page, &options).await?;

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            main: Arc::new(WebPage::new(page, None)),
            options,
        })
    }
}

#[async_trait]
impl BrowserDriver for WebDriver {
    fn browser_name(&self) -> &str {
        "chromium"
    }

    fn main_page(&self) -> Arc<dyn PageDriver> {
        self.main.clone()
    }

    async fn open_tab(&self) -> Result<Arc<dyn PageDriver>> {
        let page = self
            .context
            .new_page()
            .await
            .context("Failed to open new tab")?;
        set_viewport(&page, &self.options).await?;
        Ok(Arc::new(WebPage::new(page, None)))
    }

    async fn open_isolated(&self) -> Result<Arc<dyn PageDriver>> {
        let context = self
            .browser
            .context_builder()
            .build()
            .await
            .context("Failed to create isolated browser context")?;
        let page = context.new_page().await.context("Failed to open page")?;
        set_viewport(&page, &self.options).await?;
        Ok(Arc::new(WebPage::new(page, Some(context))))
    }

    async fn quit(&self) -> Result<()> {
        self.browser.close().await.context("Failed to close browser")?;
        info!("Browser closed");
        Ok(())
    }
}

/// One Playwright tab. Isolated tabs own their browser context.
pub struct WebPage {
    page: Arc<Mutex<Page>>,
    own_context: Option<BrowserContext>,
}

impl WebPage {
    fn new(page: Page, own_context: Option<BrowserContext>) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            own_context,
        }
    }

    async fn evaluate_string(&self, js: &str) -> Result<String> {
        let page = self.page.lock().await;
        let value: String = page.evaluate::<(), String>(js, ()).await?;
        Ok(value)
    }
}

/// Convert a Locator to a Playwright selector string
fn locator_to_playwright(locator: &Locator) -> String {
    match locator {
        Locator::Name(name) => format!("[name=\"{}\"]", name),
        Locator::Id(id) => format!("#{}", id),
        Locator::Css(css) => css.clone(),
        Locator::TextContains(text) => {
            format!("xpath=//*[contains(text(),{})]", xpath_literal(text))
        }
        Locator::XPath(xpath) => format!("xpath={}", xpath),
    }
}

fn xpath_literal(text: &str) -> String {
    if text.contains('\'') {
        format!("\"{}\"", text)
    } else {
        format!("'{}'", text)
    }
}

#[async_trait]
impl PageDriver for WebPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.evaluate_string("() => window.location.href").await
    }

    async fn page_source(&self) -> Result<String> {
        let page = self.page.lock().await;
        let html = page.content().await?;
        Ok(html)
    }

    async fn title(&self) -> Result<String> {
        self.evaluate_string("() => document.title").await
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        Ok(page.query_selector(&sel).await?.is_some())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let current = self.field_value(locator).await?.unwrap_or_default();
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        let element = page
            .query_selector(&sel)
            .await?
            .ok_or_else(|| HarnessError::ElementMissing(locator.to_string()))?;
        let value = format!("{}{}", current, text);
        element.fill_builder(&value).fill().await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> Result<()> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        let element = page
            .query_selector(&sel)
            .await?
            .ok_or_else(|| HarnessError::ElementMissing(locator.to_string()))?;
        element.fill_builder("").fill().await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        page.click_builder(&sel)
            .click()
            .await
            .with_context(|| format!("Failed to click: {}", locator))?;
        Ok(())
    }

    async fn double_click(&self, locator: &Locator) -> Result<()> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        page.dblclick_builder(&sel)
            .dblclick()
            .await
            .with_context(|| format!("Failed to double-click: {}", locator))?;
        Ok(())
    }

    async fn is_checked(&self, locator: &Locator) -> Result<bool> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        let checked: bool = page
            .evaluate_on_selector::<String, bool>(&sel, "el => !!el.checked", None)
            .await
            .with_context(|| format!("Element not found: {}", locator))?;
        Ok(checked)
    }

    async fn field_value(&self, locator: &Locator) -> Result<Option<String>> {
        let page = self.page.lock().await;
        let sel = locator_to_playwright(locator);
        if page.query_selector(&sel).await?.is_none() {
            return Ok(None);
        }
        let value: String = page
            .evaluate_on_selector::<String, String>(&sel, "el => el.value || ''", None)
            .await?;
        Ok(Some(value))
    }

    async fn execute_script(&self, script: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.evaluate::<(), ()>(script, ())
            .await
            .context("Script execution failed")?;
        Ok(())
    }

    async fn take_screenshot(&self, path: &Path) -> Result<()> {
        let page = self.page.lock().await;
        let path_buf = path.to_path_buf();

        if let Some(parent) = path_buf.parent() {
            std::fs::create_dir_all(parent)?;
        }

        page.screenshot_builder()
            .path(path_buf)
            .screenshot()
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let page = self.page.lock().await;
        page.close(None).await.context("Failed to close tab")?;
        if let Some(ref context) = self.own_context {
            context.close().await.context("Failed to close browser context")?;
        }
        Ok(())
    }
}

async fn set_viewport(page: &Page, options: &LaunchOptions) -> Result<()> {
    page.set_viewport_size(Viewport {
        width: options.viewport_width as i32,
        height: options.viewport_height as i32,
    })
    .await?;
    Ok(())
}

/// Launch a new Chromium browser, preferring a system-installed binary
async fn launch_chromium_browser(
    chromium: &playwright::api::BrowserType,
    options: &LaunchOptions,
) -> Result<Browser> {
    let mut launcher = chromium.launcher();
    launcher = launcher.headless(options.headless);

    let env_path = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
        .ok()
        .map(std::path::PathBuf::from);

    let executable = env_path.or_else(find_system_browser);
    if let Some(ref path) = executable {
        info!("Using browser: {}", path.display());
        launcher = launcher.executable(path);
    } else {
        debug!("No browser executable found, using Playwright default");
    }

    let args = launch_args(options);
    launcher = launcher.args(&args);

    let browser = launcher
        .launch()
        .await
        .context("Failed to launch Chromium")?;
    Ok(browser)
}

fn launch_args(options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--ignore-certificate-errors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if options.maximized && !options.headless {
        args.push("--start-maximized".to_string());
    }
    args
}

fn find_system_browser() -> Option<std::path::PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    common_paths
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(|p| p.to_path_buf())
}
