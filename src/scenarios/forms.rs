//! Page helpers shared by the registration and login scenarios

use anyhow::Result;

use crate::driver::{Locator, PageDriver};
use crate::error::HarnessError;
use crate::runner::context::ScenarioContext;
use crate::runner::wait::OutcomeSet;

pub const SUCCESS_MARKER: &str = "register=success";
pub const DUPLICATE_MARKER: &str = "already been registered";
pub const TERMS_CHECKBOX: &str = "form2Example3c";

pub fn field(name: &str) -> Locator {
    Locator::name(name)
}

pub fn submit_button() -> Locator {
    Locator::css("button[type='submit']")
}

/// Values typed into the registration form
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }
}

/// Open the registration page on `page` and wait for the form
pub async fn open_register(ctx: &ScenarioContext<'_>, page: &dyn PageDriver) -> Result<()> {
    ctx.load(page, &ctx.config.register_url(), &field("email"))
        .await
}

/// Open the login page on `page` and wait for the form
pub async fn open_login(ctx: &ScenarioContext<'_>, page: &dyn PageDriver) -> Result<()> {
    ctx.load(page, &ctx.config.login_url(), &field("email")).await
}

/// Tick the terms checkbox unless it already is
pub async fn accept_terms(page: &dyn PageDriver) -> Result<()> {
    let terms = Locator::id(TERMS_CHECKBOX);
    if !page.is_checked(&terms).await? {
        page.click(&terms).await?;
    }
    Ok(())
}

/// Type every field of `form` and accept the terms
pub async fn fill_registration(page: &dyn PageDriver, form: &RegistrationForm) -> Result<()> {
    page.type_text(&field("username"), &form.username).await?;
    page.type_text(&field("email"), &form.email).await?;
    page.type_text(&field("password"), &form.password).await?;
    page.type_text(&field("confirmPassword"), &form.confirm_password)
        .await?;
    accept_terms(page).await
}

/// The target page never showed its form
pub fn page_timed_out(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::PageNotReady { .. })
    )
}

pub async fn submit(page: &dyn PageDriver) -> Result<()> {
    page.click(&submit_button()).await
}

/// Full registration round trip on the main tab
pub async fn register(ctx: &ScenarioContext<'_>, form: &RegistrationForm) -> Result<PageState> {
    let page = ctx.page();
    open_register(ctx, page.as_ref()).await?;
    fill_registration(page.as_ref(), form).await?;
    submit(page.as_ref()).await?;
    ctx.wait_for(page.as_ref(), &OutcomeSet::registration()).await;
    PageState::read(page.as_ref()).await
}

/// Type credentials into an open login form and submit
pub async fn submit_login(page: &dyn PageDriver, email: &str, password: &str) -> Result<()> {
    page.type_text(&field("email"), email).await?;
    page.type_text(&field("password"), password).await?;
    submit(page).await
}

/// Clear both login fields, then type and submit
pub async fn resubmit_login(page: &dyn PageDriver, email: &str, password: &str) -> Result<()> {
    page.clear(&field("email")).await?;
    page.type_text(&field("email"), email).await?;
    page.clear(&field("password")).await?;
    page.type_text(&field("password"), password).await?;
    submit(page).await
}

/// Snapshot of a page after an outcome wait
#[derive(Debug, Clone)]
pub struct PageState {
    pub url: String,
    /// Lower-cased page source
    pub source: String,
    pub source_len: usize,
}

impl PageState {
    pub async fn read(page: &dyn PageDriver) -> Result<Self> {
        let url = page.current_url().await?;
        let raw = page.page_source().await?;
        Ok(Self {
            url,
            source_len: raw.chars().count(),
            source: raw.to_lowercase(),
        })
    }

    /// Registration went through
    pub fn accepted(&self) -> bool {
        self.url.contains(SUCCESS_MARKER) || self.source.contains("sign in")
    }

    pub fn on_register_page(&self, register_url: &str) -> bool {
        self.url.contains(register_url) && !self.url.contains(SUCCESS_MARKER)
    }

    pub fn has(&self, fragment: &str) -> bool {
        self.source.contains(fragment)
    }

    pub fn is_duplicate(&self) -> bool {
        self.has(DUPLICATE_MARKER)
    }

    /// Signs of a server fault instead of a handled response
    pub fn crashed(&self, include_sql: bool) -> bool {
        self.has("500")
            || self.has("exception")
            || (include_sql && self.has("sql"))
            || self.source_len < 1000
    }

    /// Explicit backend rejection: error route or warning marker, not a duplicate
    pub fn backend_rejected(&self) -> bool {
        !self.is_duplicate() && (self.url.contains("error") || self.has("⚠️"))
    }
}
