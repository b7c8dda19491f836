//! In-memory stand-in for the application under test.
//!
//! Models the register, login and welcome pages closely enough for scenario
//! logic to be exercised without a browser: email normalisation, password
//! policy, duplicate detection, lockout and cookie-jar sessions. Behaviour is
//! switched through [`AppPolicy`] so both the well-behaved and the buggy
//! variants of each property can be tested.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::{BrowserDriver, BrowserLauncher, LaunchOptions, Locator, PageDriver};
use crate::error::HarnessError;

const SEED_EMAIL: &str = "admin@system.com";
const SEED_PASSWORD: &str = "LA2028sGoldM";

const LOCK_MESSAGE: &str =
    "⚠️ Your account is locked due to too many failed attempts. Please try again later.";
const BAD_LOGIN_MESSAGE: &str = "⚠️ Incorrect email or password";
const EMPTY_EMAIL_MESSAGE: &str = "⚠️ Please enter a valid email address";
const DUPLICATE_MESSAGE: &str = "⚠️ This email address has already been registered";
const PASSWORD_MESSAGE: &str =
    "⚠️ Invalid password: use 3 to ≤ 25 characters with upper and lower case letters and a digit";

/// Behaviour switches for the simulated application
#[derive(Debug, Clone)]
pub struct AppPolicy {
    pub trims_emails: bool,
    pub case_insensitive_emails: bool,
    pub trims_passwords: bool,
    pub validates_email: bool,
    pub min_password: usize,
    pub max_password: usize,
    pub require_mixed: bool,
    pub max_username: Option<usize>,
    /// Usernames longer than this produce a server error page
    pub crash_username_over: Option<usize>,
    /// The register page stops rendering its form after this many submits
    pub stall_register_after: Option<usize>,
    pub allow_duplicates: bool,
    /// Duplicate check and insert are not atomic
    pub racy_registration: bool,
    pub retains_form_on_error: bool,
    pub lockout_threshold: Option<u32>,
    /// Count failed logins for every account together
    pub lockout_per_origin: bool,
    /// A new login ends the user's other sessions
    pub single_session: bool,
    pub fail_screenshots: bool,
}

impl Default for AppPolicy {
    fn default() -> Self {
        Self {
            trims_emails: true,
            case_insensitive_emails: true,
            trims_passwords: true,
            validates_email: true,
            min_password: 3,
            max_password: 25,
            require_mixed: true,
            max_username: Some(50),
            crash_username_over: None,
            stall_register_after: None,
            allow_duplicates: false,
            racy_registration: false,
            retains_form_on_error: true,
            lockout_threshold: Some(5),
            lockout_per_origin: false,
            single_session: false,
            fail_screenshots: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    username: String,
    password: String,
}

struct AppState {
    policy: AppPolicy,
    accounts: HashMap<String, Account>,
    registrations: usize,
    register_submits: usize,
    failed_logins: HashMap<String, u32>,
    sessions: HashMap<u64, String>,
    next_jar: u64,
}

/// Shared handle on the simulated application
#[derive(Clone)]
pub struct MockApp {
    state: Arc<Mutex<AppState>>,
}

impl MockApp {
    pub fn new(policy: AppPolicy) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            SEED_EMAIL.to_string(),
            Account {
                username: "admin".to_string(),
                password: SEED_PASSWORD.to_string(),
            },
        );
        Self {
            state: Arc::new(Mutex::new(AppState {
                policy,
                accounts,
                registrations: 0,
                register_submits: 0,
                failed_logins: HashMap::new(),
                sessions: HashMap::new(),
                next_jar: 1,
            })),
        }
    }

    pub fn launcher(&self) -> MockLauncher {
        MockLauncher {
            app: self.clone(),
            fail_launch: false,
        }
    }

    /// Launcher whose browser never starts
    pub fn failing_launcher(&self) -> MockLauncher {
        MockLauncher {
            app: self.clone(),
            fail_launch: true,
        }
    }

    /// Successful registrations, duplicates included
    pub fn registrations(&self) -> usize {
        self.lock().registrations
    }

    pub fn has_account(&self, email: &str) -> bool {
        let state = self.lock();
        let key = normalise_key(&state.policy, email);
        state.accounts.contains_key(&key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AppState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn policy(&self) -> AppPolicy {
        self.lock().policy.clone()
    }

    fn register_stalled(&self) -> bool {
        let state = self.lock();
        state
            .policy
            .stall_register_after
            .is_some_and(|limit| state.register_submits >= limit)
    }

    fn new_jar(&self) -> u64 {
        let mut state = self.lock();
        let jar = state.next_jar;
        state.next_jar += 1;
        jar
    }

    async fn register(&self, form: &HashMap<String, String>) -> SubmitOutcome {
        let field = |name: &str| form.get(name).cloned().unwrap_or_default();
        let policy = {
            let mut state = self.lock();
            state.register_submits += 1;
            state.policy.clone()
        };

        let username = field("username");
        let mut email = field("email");
        let mut password = field("password");
        let mut confirm = field("confirmPassword");

        if let Some(limit) = policy.crash_username_over {
            if username.chars().count() > limit {
                return SubmitOutcome::ServerError;
            }
        }
        if username.is_empty() || email.is_empty() {
            return SubmitOutcome::Rejected("⚠️ All fields are required".to_string());
        }
        if policy.trims_emails {
            email = email.trim().to_string();
        }
        if policy.validates_email && !is_valid_email(&email) {
            return SubmitOutcome::Rejected("⚠️ Please use a valid email format".to_string());
        }
        if let Some(limit) = policy.max_username {
            if username.chars().count() > limit {
                return SubmitOutcome::Rejected("⚠️ Username is too long".to_string());
            }
        }
        if policy.trims_passwords {
            password = password.trim().to_string();
            confirm = confirm.trim().to_string();
        }
        if password != confirm {
            return SubmitOutcome::Rejected("⚠️ Passwords do not match".to_string());
        }
        if !password_allowed(&policy, &password) {
            return SubmitOutcome::Rejected(PASSWORD_MESSAGE.to_string());
        }

        let key = normalise_key(&policy, &email);
        let account = Account { username, password };

        if policy.racy_registration {
            let exists = self.lock().accounts.contains_key(&key);
            if exists && !policy.allow_duplicates {
                return SubmitOutcome::Rejected(DUPLICATE_MESSAGE.to_string());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            let mut state = self.lock();
            state.accounts.insert(key, account);
            state.registrations += 1;
            return SubmitOutcome::Registered;
        }

        let mut state = self.lock();
        if state.accounts.contains_key(&key) && !policy.allow_duplicates {
            return SubmitOutcome::Rejected(DUPLICATE_MESSAGE.to_string());
        }
        state.accounts.insert(key, account);
        state.registrations += 1;
        SubmitOutcome::Registered
    }

    fn login(&self, jar: u64, form: &HashMap<String, String>) -> SubmitOutcome {
        let mut state = self.lock();
        let policy = state.policy.clone();

        let mut email = form.get("email").cloned().unwrap_or_default();
        let mut password = form.get("password").cloned().unwrap_or_default();
        if policy.trims_emails {
            email = email.trim().to_string();
        }
        if policy.trims_passwords {
            password = password.trim().to_string();
        }
        if email.is_empty() {
            return SubmitOutcome::Rejected(EMPTY_EMAIL_MESSAGE.to_string());
        }

        let key = normalise_key(&policy, &email);
        let lock_key = if policy.lockout_per_origin {
            "origin".to_string()
        } else {
            key.clone()
        };

        if let Some(threshold) = policy.lockout_threshold {
            if state.failed_logins.get(&lock_key).copied().unwrap_or(0) >= threshold {
                return SubmitOutcome::Rejected(LOCK_MESSAGE.to_string());
            }
        }

        let valid = state
            .accounts
            .get(&key)
            .map(|a| a.password == password)
            .unwrap_or(false);

        if !valid {
            *state.failed_logins.entry(lock_key).or_insert(0) += 1;
            return SubmitOutcome::Rejected(BAD_LOGIN_MESSAGE.to_string());
        }

        state.failed_logins.remove(&lock_key);
        if policy.single_session {
            state.sessions.retain(|_, user| *user != key);
        }
        state.sessions.insert(jar, key);
        SubmitOutcome::LoggedIn
    }

    fn session_user(&self, jar: u64) -> Option<String> {
        let state = self.lock();
        let key = state.sessions.get(&jar)?;
        state.accounts.get(key).map(|a| a.username.clone())
    }
}

fn normalise_key(policy: &AppPolicy, email: &str) -> String {
    if policy.case_insensitive_emails {
        email.to_lowercase()
    } else {
        email.to_string()
    }
}

fn password_allowed(policy: &AppPolicy, password: &str) -> bool {
    let len = password.chars().count();
    if len < policy.min_password || len > policy.max_password {
        return false;
    }
    if policy.require_mixed {
        let upper = password.chars().any(|c| c.is_uppercase());
        let lower = password.chars().any(|c| c.is_lowercase());
        let digit = password.chars().any(|c| c.is_ascii_digit());
        return upper && lower && digit;
    }
    true
}

/// Loose RFC-style check: one `@`, sane local part, dotted domain labels
fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(|c| c.is_whitespace() || "<>#,;".contains(c)) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if domain == "localhost" {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |l: &&str| {
        !l.is_empty()
            && !l.starts_with('-')
            && !l.ends_with('-')
            && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };
    let tld_ok = labels.last().map(|t| t.len() >= 2).unwrap_or(false);
    labels.iter().all(label_ok) && tld_ok
}

enum SubmitOutcome {
    Registered,
    LoggedIn,
    Rejected(String),
    ServerError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Register,
    Login,
    Welcome,
    ServerError,
    NotFound,
}

struct View {
    origin: String,
    url: String,
    screen: Screen,
    fields: HashMap<String, String>,
    terms_checked: bool,
    message: Option<String>,
    banner: Option<String>,
    greeting: Option<String>,
    closed: bool,
}

impl View {
    fn blank() -> Self {
        Self {
            origin: String::new(),
            url: "about:blank".to_string(),
            screen: Screen::Blank,
            fields: HashMap::new(),
            terms_checked: false,
            message: None,
            banner: None,
            greeting: None,
            closed: false,
        }
    }

    fn show(&mut self, screen: Screen, path: &str) {
        self.screen = screen;
        self.url = format!("{}{}", self.origin, path);
        self.fields = field_names(screen)
            .iter()
            .map(|n| (n.to_string(), String::new()))
            .collect();
        self.terms_checked = false;
        self.message = None;
        self.banner = None;
        self.greeting = None;
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn has_submit(&self) -> bool {
        matches!(self.screen, Screen::Register | Screen::Login)
    }

    fn texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = match self.screen {
            Screen::Blank => vec![],
            Screen::Register => vec![
                "Create your account".to_string(),
                "I agree to the Terms of service".to_string(),
                "Register".to_string(),
                "Already have an account? Login here".to_string(),
            ],
            Screen::Login => vec![
                "Login".to_string(),
                "Please sign in to continue".to_string(),
            ],
            Screen::Welcome => vec![
                self.greeting.clone().unwrap_or_default(),
                "Logout".to_string(),
            ],
            Screen::ServerError => vec![
                "HTTP Status 500 - Internal Server Error".to_string(),
                "java.sql.SQLException: value too long for column".to_string(),
            ],
            Screen::NotFound => vec!["HTTP Status 404 - Not Found".to_string()],
        };
        texts.extend(self.banner.iter().cloned());
        texts.extend(self.message.iter().cloned());
        texts
    }

    fn html(&self) -> String {
        let mut body = String::new();
        for text in self.texts() {
            if self.message.as_deref() == Some(text.as_str()) {
                body.push_str(&format!("<div class=\"error-message\">{}</div>\n", text));
            } else {
                body.push_str(&format!("<p>{}</p>\n", text));
            }
        }
        for (name, value) in &self.fields {
            let kind = if name.to_lowercase().contains("password") {
                "password"
            } else {
                "text"
            };
            body.push_str(&format!(
                "<input type=\"{}\" name=\"{}\" value=\"{}\">\n",
                kind, name, value
            ));
        }
        if self.screen == Screen::Register {
            body.push_str("<input type=\"checkbox\" id=\"form2Example3c\">\n");
        }
        if self.has_submit() {
            body.push_str("<button type=\"submit\">Submit</button>\n");
        }
        if matches!(self.screen, Screen::Register | Screen::Login | Screen::Welcome) {
            body.push_str("<footer>");
            for _ in 0..25 {
                body.push_str("Copyright Example Corp. All rights reserved. ");
            }
            body.push_str("</footer>\n");
        }
        format!(
            "<html><head><title>{:?}</title></head><body>\n{}</body></html>",
            self.screen, body
        )
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Name(name) => self.has_field(name),
            Locator::Id(id) => id == "form2Example3c" && self.screen == Screen::Register,
            Locator::Css(css) => match css.as_str() {
                "button[type='submit']" => self.has_submit(),
                ".error-message" => self.message.is_some(),
                _ => false,
            },
            Locator::TextContains(fragment) => self.texts().iter().any(|t| t.contains(fragment)),
            Locator::XPath(xpath) => {
                let mut haystack = self.texts();
                if self.message.is_some() {
                    haystack.push("error-message".to_string());
                }
                quoted_literals(xpath)
                    .iter()
                    .any(|lit| haystack.iter().any(|t| t.contains(lit.as_str())))
            }
        }
    }
}

fn field_names(screen: Screen) -> &'static [&'static str] {
    match screen {
        Screen::Register => &["username", "email", "password", "confirmPassword"],
        Screen::Login => &["email", "password"],
        _ => &[],
    }
}

fn quoted_literals(xpath: &str) -> Vec<String> {
    xpath
        .split('\'')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, s)| s.to_string())
        .collect()
}

fn split_url(url: &str) -> (String, String) {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(i) => (
            url[..after_scheme + i].to_string(),
            url[after_scheme + i..].to_string(),
        ),
        None => (url.to_string(), "/".to_string()),
    }
}

/// One simulated tab
pub struct MockPage {
    app: MockApp,
    jar: u64,
    view: Mutex<View>,
}

impl MockPage {
    fn new(app: MockApp, jar: u64) -> Self {
        Self {
            app,
            jar,
            view: Mutex::new(View::blank()),
        }
    }

    fn view(&self) -> std::sync::MutexGuard<'_, View> {
        match self.view.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn open_view(&self) -> Result<std::sync::MutexGuard<'_, View>> {
        let view = self.view();
        if view.closed {
            bail!("Tab is closed");
        }
        Ok(view)
    }

    fn render_path(&self, view: &mut View, path: &str) {
        let route = path.split('?').next().unwrap_or(path);
        match route {
            "/register.jsp" if self.app.register_stalled() => view.show(Screen::Blank, path),
            "/register.jsp" => view.show(Screen::Register, path),
            "/login.jsp" => {
                view.show(Screen::Login, path);
                if path.contains("register=success") {
                    view.banner = Some("Registration successful! Please sign in.".to_string());
                }
            }
            "/welcome.jsp" => match self.app.session_user(self.jar) {
                Some(user) => {
                    view.show(Screen::Welcome, path);
                    view.greeting = Some(format!("Welcome back, {}!", user));
                }
                None => view.show(Screen::Login, "/login.jsp"),
            },
            _ => view.show(Screen::NotFound, path),
        }
    }

    async fn submit(&self) -> Result<()> {
        let (screen, form) = {
            let view = self.open_view()?;
            (view.screen, view.fields.clone())
        };
        match screen {
            Screen::Register => {
                let accepted_terms = self.view().terms_checked;
                if !accepted_terms {
                    self.view().message = Some("⚠️ You must accept the terms".to_string());
                    return Ok(());
                }
                let outcome = self.app.register(&form).await;
                self.apply(outcome, &form);
            }
            Screen::Login => {
                let outcome = self.app.login(self.jar, &form);
                self.apply(outcome, &form);
            }
            _ => {}
        }
        Ok(())
    }

    fn apply(&self, outcome: SubmitOutcome, form: &HashMap<String, String>) {
        let retains = self.app.policy().retains_form_on_error;
        let mut view = self.view();
        match outcome {
            SubmitOutcome::Registered => {
                self.render_path(&mut view, "/login.jsp?register=success");
            }
            SubmitOutcome::LoggedIn => {
                self.render_path(&mut view, "/welcome.jsp");
            }
            SubmitOutcome::ServerError => {
                view.screen = Screen::ServerError;
                view.url = format!("{}/register", view.origin);
                view.fields.clear();
                view.message = None;
            }
            SubmitOutcome::Rejected(message) => {
                let screen = view.screen;
                let path = split_url(&view.url).1;
                let path = path.split('?').next().unwrap_or("").to_string();
                view.show(screen, &path);
                if retains {
                    for name in ["username", "email"] {
                        if let (Some(slot), Some(value)) = (view.fields.get_mut(name), form.get(name)) {
                            *slot = value.clone();
                        }
                    }
                }
                view.message = Some(message);
            }
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut view = self.open_view()?;
        let (origin, path) = split_url(url);
        view.origin = origin;
        self.render_path(&mut view, &path);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.open_view()?.url.clone())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.open_view()?.html())
    }

    async fn title(&self) -> Result<String> {
        Ok(format!("{:?}", self.open_view()?.screen))
    }

    async fn is_present(&self, locator: &Locator) -> Result<bool> {
        Ok(self.open_view()?.matches(locator))
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let mut view = self.open_view()?;
        let Locator::Name(name) = locator else {
            return Err(HarnessError::ElementMissing(locator.to_string()).into());
        };
        match view.fields.get_mut(name) {
            Some(value) => {
                value.push_str(text);
                Ok(())
            }
            None => return Err(HarnessError::ElementMissing(locator.to_string()).into()),
        }
    }

    async fn clear(&self, locator: &Locator) -> Result<()> {
        let mut view = self.open_view()?;
        let Locator::Name(name) = locator else {
            return Err(HarnessError::ElementMissing(locator.to_string()).into());
        };
        match view.fields.get_mut(name) {
            Some(value) => {
                value.clear();
                Ok(())
            }
            None => return Err(HarnessError::ElementMissing(locator.to_string()).into()),
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        {
            let mut view = self.open_view()?;
            if !view.matches(locator) {
                return Err(HarnessError::ElementMissing(locator.to_string()).into());
            }
            if let Locator::Id(_) = locator {
                view.terms_checked = !view.terms_checked;
                return Ok(());
            }
        }
        if *locator == Locator::css("button[type='submit']") {
            self.submit().await?;
        }
        Ok(())
    }

    async fn double_click(&self, locator: &Locator) -> Result<()> {
        // The second click lands on the page the first one navigated to.
        self.click(locator).await
    }

    async fn is_checked(&self, locator: &Locator) -> Result<bool> {
        let view = self.open_view()?;
        if !view.matches(locator) {
            return Err(HarnessError::ElementMissing(locator.to_string()).into());
        }
        Ok(view.terms_checked)
    }

    async fn field_value(&self, locator: &Locator) -> Result<Option<String>> {
        let view = self.open_view()?;
        match locator {
            Locator::Name(name) => Ok(view.fields.get(name).cloned()),
            _ => Ok(None),
        }
    }

    async fn execute_script(&self, script: &str) -> Result<()> {
        let mut view = self.open_view()?;
        let name = script
            .split("getElementsByName('")
            .nth(1)
            .and_then(|s| s.split('\'').next());
        let value = script
            .split(".value = '")
            .nth(1)
            .and_then(|s| s.split('\'').next());
        if let (Some(name), Some(value)) = (name, value) {
            match view.fields.get_mut(name) {
                Some(slot) => *slot = value.to_string(),
                None => bail!("TypeError: Cannot set properties of undefined"),
            }
        }
        Ok(())
    }

    async fn take_screenshot(&self, path: &Path) -> Result<()> {
        if self.app.policy().fail_screenshots {
            bail!("Screenshot failed: target closed");
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\nmock")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.view().closed = true;
        Ok(())
    }
}

/// Simulated browser process
pub struct MockBrowser {
    app: MockApp,
    main: Arc<MockPage>,
    jar: u64,
    quit: AtomicBool,
}

impl MockBrowser {
    fn ensure_running(&self) -> Result<()> {
        if self.quit.load(Ordering::SeqCst) {
            bail!("Browser has been closed");
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    fn browser_name(&self) -> &str {
        "mock"
    }

    fn main_page(&self) -> Arc<dyn PageDriver> {
        self.main.clone()
    }

    async fn open_tab(&self) -> Result<Arc<dyn PageDriver>> {
        self.ensure_running()?;
        Ok(Arc::new(MockPage::new(self.app.clone(), self.jar)))
    }

    async fn open_isolated(&self) -> Result<Arc<dyn PageDriver>> {
        self.ensure_running()?;
        let jar = self.app.new_jar();
        Ok(Arc::new(MockPage::new(self.app.clone(), jar)))
    }

    async fn quit(&self) -> Result<()> {
        self.quit.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockLauncher {
    app: MockApp,
    fail_launch: bool,
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn BrowserDriver>> {
        if self.fail_launch {
            bail!("Failed to launch Chromium: executable doesn't exist");
        }
        let jar = self.app.new_jar();
        Ok(Box::new(MockBrowser {
            app: self.app.clone(),
            main: Arc::new(MockPage::new(self.app.clone(), jar)),
            jar,
            quit: AtomicBool::new(false),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://app.test";

    async fn register(page: &MockPage, email: &str, password: &str) {
        page.goto(&format!("{}/register.jsp", BASE)).await.unwrap();
        for (name, value) in [
            ("username", "tester"),
            ("email", email),
            ("password", password),
            ("confirmPassword", password),
        ] {
            page.type_text(&Locator::name(name), value).await.unwrap();
        }
        page.click(&Locator::id("form2Example3c")).await.unwrap();
        page.click(&Locator::css("button[type='submit']"))
            .await
            .unwrap();
    }

    #[test]
    fn test_email_validation_rules() {
        assert!(is_valid_email("user+tag@gmail.com"));
        assert!(is_valid_email("user@localhost"));
        assert!(is_valid_email("user@xn--80asehdb.com"));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("user1@domain..com"));
        assert!(!is_valid_email("user1@domain.c"));
        assert!(!is_valid_email("user1@-domain.com"));
        assert!(!is_valid_email("user1 name@domain.com"));
        assert!(!is_valid_email(&format!("{}@longemail.com", "a".repeat(200))));
    }

    #[tokio::test]
    async fn test_registration_then_duplicate() {
        let app = MockApp::new(AppPolicy::default());
        let page = MockPage::new(app.clone(), 1);

        register(&page, "new@test.com", "Abc12345").await;
        assert!(page.current_url().await.unwrap().contains("register=success"));
        assert!(page.page_source().await.unwrap().contains("sign in"));

        register(&page, "NEW@test.com", "Abc12345").await;
        let source = page.page_source().await.unwrap().to_lowercase();
        assert!(source.contains("already been registered"));
        assert_eq!(app.registrations(), 1);
    }

    #[tokio::test]
    async fn test_register_page_has_no_accept_markers() {
        let app = MockApp::new(AppPolicy::default());
        let page = MockPage::new(app, 1);
        page.goto(&format!("{}/register.jsp", BASE)).await.unwrap();
        let source = page.page_source().await.unwrap().to_lowercase();
        assert!(source.len() > 1000);
        assert!(!source.contains("sign in"));
        assert!(!source.contains("error"));
        assert!(!source.contains("500"));
    }

    #[tokio::test]
    async fn test_welcome_requires_session_in_jar() {
        let app = MockApp::new(AppPolicy::default());
        let launcher = app.launcher();
        let browser = launcher.launch(&LaunchOptions {
            headless: true,
            maximized: false,
            viewport_width: 800,
            viewport_height: 600,
        })
        .await
        .unwrap();

        let main = browser.main_page();
        main.goto(&format!("{}/login.jsp", BASE)).await.unwrap();
        main.type_text(&Locator::name("email"), SEED_EMAIL).await.unwrap();
        main.type_text(&Locator::name("password"), SEED_PASSWORD).await.unwrap();
        main.click(&Locator::css("button[type='submit']")).await.unwrap();
        assert_eq!(main.current_url().await.unwrap(), format!("{}/welcome.jsp", BASE));

        let tab = browser.open_tab().await.unwrap();
        tab.goto(&format!("{}/welcome.jsp", BASE)).await.unwrap();
        assert!(tab.page_source().await.unwrap().contains("Welcome back"));

        let isolated = browser.open_isolated().await.unwrap();
        isolated.goto(&format!("{}/welcome.jsp", BASE)).await.unwrap();
        assert!(isolated.current_url().await.unwrap().ends_with("/login.jsp"));
    }

    #[tokio::test]
    async fn test_script_sets_field_value() {
        let app = MockApp::new(AppPolicy::default());
        let page = MockPage::new(app, 1);
        page.goto(&format!("{}/register.jsp", BASE)).await.unwrap();
        page.execute_script(
            "() => { const el = document.getElementsByName('email')[0]; el.value = 'x@y.com'; }",
        )
        .await
        .unwrap();
        assert_eq!(
            page.field_value(&Locator::name("email")).await.unwrap(),
            Some("x@y.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_closed_tab_rejects_calls() {
        let app = MockApp::new(AppPolicy::default());
        let page = MockPage::new(app, 1);
        page.close().await.unwrap();
        assert!(page.goto(&format!("{}/login.jsp", BASE)).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_field_is_element_missing() {
        let app = MockApp::new(AppPolicy::default());
        let page = MockPage::new(app, 1);
        page.goto(&format!("{}/login.jsp", BASE)).await.unwrap();
        let err = page
            .type_text(&Locator::name("confirmPassword"), "x")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::ElementMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_leaves_register_page() {
        let app = MockApp::new(AppPolicy {
            crash_username_over: Some(3),
            ..AppPolicy::default()
        });
        let page = MockPage::new(app, 1);
        register(&page, "crash@test.com", "Abc12345").await;

        assert_eq!(page.current_url().await.unwrap(), format!("{}/register", BASE));
        assert!(page.page_source().await.unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_register_page_stalls_after_limit() {
        let app = MockApp::new(AppPolicy {
            stall_register_after: Some(1),
            ..AppPolicy::default()
        });
        let page = MockPage::new(app, 1);
        register(&page, "first@test.com", "Abc12345").await;

        page.goto(&format!("{}/register.jsp", BASE)).await.unwrap();
        assert!(!page.is_present(&Locator::name("email")).await.unwrap());
        page.goto(&format!("{}/login.jsp", BASE)).await.unwrap();
        assert!(page.is_present(&Locator::name("email")).await.unwrap());
    }
}
