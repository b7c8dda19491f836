//! Login security: lockout, weak credentials and session handling.
//!
//! These scenarios sign in as the fixed fallback account, so they change its
//! lockout state on the target. Run order inside the group matters.

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::{error, info, warn};

use super::forms::{open_login, resubmit_login, submit_login, PageState};
use super::{Scenario, ScenarioGroup};
use crate::driver::PageDriver;
use crate::runner::context::ScenarioContext;
use crate::runner::state::Verdict;
use crate::runner::wait::{OutcomeSet, WaitCondition};

const FAILED_ATTEMPTS: usize = 5;

const LOCK_MARKERS: [&str; 5] = [
    "locked",
    "too many",
    "try again later",
    "account is locked",
    "generic error",
];

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "login-security",
        title: "Login Security",
        fixture: None,
        scenarios: vec![
            Box::new(AccountLockout),
            Box::new(WeakCredentials),
            Box::new(ConcurrentLogin),
            Box::new(LockoutScope),
        ],
    }
}

/// Submit `FAILED_ATTEMPTS` wrong passwords for `email` on an open login page
async fn fail_logins(
    ctx: &ScenarioContext<'_>,
    page: &dyn PageDriver,
    email: &str,
    wrong_password: &str,
    delay_ms: u64,
) -> Result<()> {
    for attempt in 1..=FAILED_ATTEMPTS {
        resubmit_login(page, email, wrong_password).await?;
        info!("Failed login attempt {}/{} for {}", attempt, FAILED_ATTEMPTS, email);
        ctx.pause(delay_ms).await;
    }
    Ok(())
}

pub struct AccountLockout;

#[async_trait]
impl Scenario for AccountLockout {
    fn name(&self) -> &'static str {
        "LGN-010 - Account Lockout After Consecutive Failed Logins"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        let email = ctx.config.fallback_email.clone();
        let welcome_url = ctx.config.welcome_url();

        open_login(ctx, page.as_ref()).await?;
        fail_logins(
            ctx,
            page.as_ref(),
            &email,
            "wrongpass123",
            ctx.config.lockout_attempt_delay_ms,
        )
        .await?;

        resubmit_login(page.as_ref(), &email, &ctx.config.fallback_password).await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::lockout(&welcome_url))
            .await;

        let state = PageState::read(page.as_ref()).await?;
        if state.url.contains(&welcome_url) {
            ctx.capture("LGN010_NO_LOCKOUT").await;
            return Ok(
                Verdict::fail("CRITICAL: Account NOT locked after 5 failed attempts!")
                    .with_severity("CRITICAL"),
            );
        }

        if LOCK_MARKERS.iter().any(|m| state.has(m)) {
            Ok(Verdict::pass("Account correctly locked after 5 failed attempts"))
        } else {
            ctx.capture("LOGIN010_generic_or_no_message").await;
            Ok(Verdict::fail(
                "Account locked but no clear lock message (generic error shown?)",
            ))
        }
    }
}

/// Common default credentials; only the last pair is the real one
const COMMON_CREDENTIALS: [(&str, &str); 7] = [
    ("admin", "admin"),
    ("admin", "123456"),
    ("admin", "password"),
    ("admin@system.com", "admin"),
    ("admin@system.com", "123456"),
    ("admin@system.com", "root"),
    ("admin@system.com", "LA2028sGoldM"),
];

pub struct WeakCredentials;

#[async_trait]
impl Scenario for WeakCredentials {
    fn name(&self) -> &'static str {
        "LGN-011 - Common/Default Admin Passwords & Weak Credential Rejection"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        let welcome_url = ctx.config.welcome_url();
        let timeout_ms = ctx.config.default_timeout_ms * 12 / 10;
        let total = COMMON_CREDENTIALS.len();
        let mut correct = 0;

        for (email, password) in COMMON_CREDENTIALS {
            let genuine =
                email == ctx.config.fallback_email && password == ctx.config.fallback_password;

            open_login(ctx, page.as_ref()).await?;
            submit_login(page.as_ref(), email, password).await?;
            ctx.wait_for_within(page.as_ref(), &OutcomeSet::lockout(&welcome_url), timeout_ms)
                .await;

            let state = PageState::read(page.as_ref()).await?;
            if state.url.contains(&welcome_url) {
                if genuine {
                    info!("Expected success: {} with strong password", email);
                    correct += 1;
                } else {
                    error!("Login succeeded with weak/common credential: {}/{}", email, password);
                    ctx.capture(&format!("LGN011_WEAK_CRED_SUCCESS_{}", email.replace('@', "_")))
                        .await;
                }
            } else if state.has("invalid credentials") || state.has("incorrect") {
                if !genuine {
                    correct += 1;
                }
            } else {
                warn!("Unclear response for {}/{}", email, password);
            }
        }

        if correct + 1 >= total {
            Ok(Verdict::pass(format!(
                "Properly rejected weak/common admin credentials ({}/{} correct)",
                correct, total
            )))
        } else {
            Ok(Verdict::fail(format!(
                "Too many weak credentials allowed ({}/{})",
                correct, total
            )))
        }
    }
}

/// Verdict from whether each session still reaches the landing page
pub fn session_verdict(first_valid: bool, second_valid: bool) -> Verdict {
    match (first_valid, second_valid) {
        (true, true) => Verdict::pass("Multiple concurrent sessions allowed (common behavior)"),
        (false, true) => Verdict::pass("Second login invalidated first session (secure behavior)"),
        _ => Verdict::fail("Inconsistent session state after concurrent login"),
    }
}

pub struct ConcurrentLogin;

impl ConcurrentLogin {
    async fn sign_in(ctx: &ScenarioContext<'_>, page: &dyn PageDriver) -> Result<()> {
        let welcome_url = ctx.config.welcome_url();
        open_login(ctx, page).await?;
        submit_login(page, &ctx.config.fallback_email, &ctx.config.fallback_password).await?;

        let landed = OutcomeSet {
            label: "landing page",
            conditions: vec![WaitCondition::UrlEquals(welcome_url.clone())],
        };
        if !ctx.wait_for(page, &landed).await.is_met() {
            bail!("Login did not reach {}", welcome_url);
        }
        Ok(())
    }

    async fn session_valid(page: &dyn PageDriver) -> Result<bool> {
        Ok(page.page_source().await?.contains("Welcome back"))
    }

    async fn check_sessions(ctx: &ScenarioContext<'_>, second: &dyn PageDriver) -> Result<(bool, bool)> {
        let first = ctx.page();
        Self::sign_in(ctx, first.as_ref()).await?;
        info!("First session established");
        Self::sign_in(ctx, second).await?;
        info!("Second session established");

        let welcome_url = ctx.config.welcome_url();
        first.goto(&welcome_url).await?;
        second.goto(&welcome_url).await?;
        ctx.pause(ctx.config.session_settle_ms).await;

        Ok((
            Self::session_valid(first.as_ref()).await?,
            Self::session_valid(second).await?,
        ))
    }
}

#[async_trait]
impl Scenario for ConcurrentLogin {
    fn name(&self) -> &'static str {
        "LGN-016 - Concurrent Login with Same User (Session Handling)"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let second = match ctx.open_isolated().await {
            Ok(page) => page,
            Err(e) => {
                error!("Concurrent login test failed: {:#}", e);
                return Ok(Verdict::error("Test execution failed due to environment"));
            }
        };

        let result = Self::check_sessions(ctx, second.as_ref()).await;
        if let Err(e) = second.close().await {
            warn!("Failed to close second session: {:#}", e);
        }

        match result {
            Ok((first_valid, second_valid)) => Ok(session_verdict(first_valid, second_valid)),
            Err(e) => {
                error!("Concurrent login test failed: {:#}", e);
                Ok(Verdict::error("Test execution failed due to environment"))
            }
        }
    }
}

/// Another account's failed attempts must not lock out this one
pub struct LockoutScope;

#[async_trait]
impl Scenario for LockoutScope {
    fn name(&self) -> &'static str {
        "LGN-017 - Account Lockout Scope (Per Account, Not Per IP)"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        let email = ctx.config.fallback_email.clone();

        open_login(ctx, page.as_ref()).await?;
        fail_logins(
            ctx,
            page.as_ref(),
            &email,
            "wrong123",
            ctx.config.scope_attempt_delay_ms,
        )
        .await?;

        open_login(ctx, page.as_ref()).await?;
        submit_login(page.as_ref(), "nonexistent@test.com", "any").await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::lockout(&ctx.config.welcome_url()))
            .await;

        let state = PageState::read(page.as_ref()).await?;
        if state.has("locked") || state.has("too many") {
            ctx.capture("LGN017_IP_BASED_LOCK").await;
            Ok(
                Verdict::fail("CRITICAL: Lockout appears to be IP-based, not account-based!")
                    .with_severity("CRITICAL"),
            )
        } else {
            Ok(Verdict::pass(
                "Lockout is correctly per-account: User B unaffected by User A's failed attempts",
            ))
        }
    }
}
