use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Element locator for form fields and page markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Select by the `name` attribute of a form control
    Name(String),
    /// Select by element id
    Id(String),
    /// Select by CSS selector
    Css(String),
    /// Select any element whose own text contains the given fragment
    TextContains(String),
    /// Select by XPath
    XPath(String),
}

impl Locator {
    pub fn name(name: &str) -> Self {
        Locator::Name(name.to_string())
    }

    pub fn id(id: &str) -> Self {
        Locator::Id(id.to_string())
    }

    pub fn css(css: &str) -> Self {
        Locator::Css(css.to_string())
    }

    pub fn text(fragment: &str) -> Self {
        Locator::TextContains(fragment.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(n) => write!(f, "name={}", n),
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Css(css) => write!(f, "css={}", css),
            Locator::TextContains(t) => write!(f, "text~={}", t),
            Locator::XPath(x) => write!(f, "xpath={}", x),
        }
    }
}

/// Options used when a browser is launched for a scenario group
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub maximized: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

/// A single browser tab
///
/// Every interaction a scenario has with the target application goes
/// through this trait, so scenario logic can be exercised against a
/// simulated application in tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current location of the tab
    async fn current_url(&self) -> Result<String>;

    /// Full rendered HTML of the current document
    async fn page_source(&self) -> Result<String>;

    /// Document title
    async fn title(&self) -> Result<String>;

    /// Check whether at least one element matches the locator right now
    async fn is_present(&self, locator: &Locator) -> Result<bool>;

    /// Append text to a form control, like typing into it
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Clear the value of a form control
    async fn clear(&self, locator: &Locator) -> Result<()>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    async fn double_click(&self, locator: &Locator) -> Result<()>;

    /// Checked state of a checkbox
    async fn is_checked(&self, locator: &Locator) -> Result<bool>;

    /// Value of a form control, or `None` when no element matches
    async fn field_value(&self, locator: &Locator) -> Result<Option<String>>;

    /// Run a script in the page. The script must be a function expression.
    async fn execute_script(&self, script: &str) -> Result<()>;

    /// Save an image of the visible page to `path`
    async fn take_screenshot(&self, path: &Path) -> Result<()>;

    /// Close this tab
    async fn close(&self) -> Result<()>;
}

/// A running browser owning one main tab
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    fn browser_name(&self) -> &str;

    /// The tab opened at launch
    fn main_page(&self) -> Arc<dyn PageDriver>;

    /// Open another tab sharing cookies with the main tab
    async fn open_tab(&self) -> Result<Arc<dyn PageDriver>>;

    /// Open a tab in a fresh, isolated browser session (no shared cookies)
    async fn open_isolated(&self) -> Result<Arc<dyn PageDriver>>;

    /// Shut the browser down
    async fn quit(&self) -> Result<()>;
}

/// Starts browsers. One launch happens per scenario group.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserDriver>>;
}
