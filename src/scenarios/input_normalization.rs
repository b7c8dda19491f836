//! Registration scenarios for input normalisation, form robustness and
//! concurrent submissions.
//!
//! The two race scenarios drive a second tab that shares the main tab's
//! browser session. Both submits are started from separate tasks and joined
//! before either page is inspected.

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use super::forms::{
    accept_terms, field, fill_registration, open_login, open_register, register, submit,
    submit_button, submit_login, PageState, RegistrationForm, SUCCESS_MARKER,
};
use super::{Scenario, ScenarioGroup};
use crate::driver::PageDriver;
use crate::runner::context::ScenarioContext;
use crate::runner::probe::{probe_value, Presence, Probe};
use crate::runner::state::Verdict;
use crate::runner::wait::OutcomeSet;

const PASSWORD: &str = "Test1234abcd";

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "input-normalization",
        title: "Input Normalization & Robustness",
        fixture: None,
        scenarios: vec![
            Box::new(EmailSpaces),
            Box::new(EmailCaseDuplicate),
            Box::new(FrontendBypass),
            Box::new(PasswordSpaces),
            Box::new(FormStateRetention),
            Box::new(DoubleClickSubmit),
            Box::new(ConcurrentSameEmail),
            Box::new(ConcurrentDifferentAccounts),
        ],
    }
}

fn spaced_emails(stamp: i64) -> [String; 4] {
    let email = format!("edge{}@test.com", stamp);
    [
        format!("  1{} ", email),
        format!("\t2{}\t", email),
        format!(" 3{}", email),
        format!("4{}  ", email),
    ]
}

/// Register on the main tab and a second tab at the same time.
///
/// The second tab is closed before returning, whatever the outcome.
async fn race_registration(
    ctx: &ScenarioContext<'_>,
    forms: [&RegistrationForm; 2],
    settle_ms: u64,
) -> Result<[PageState; 2]> {
    let main = ctx.page();
    let tab = ctx.open_tab().await?;
    let result = race_on(ctx, [main, tab.clone()], forms, settle_ms).await;
    if let Err(e) = tab.close().await {
        warn!("Failed to close second tab: {:#}", e);
    }
    result
}

async fn race_on(
    ctx: &ScenarioContext<'_>,
    pages: [Arc<dyn PageDriver>; 2],
    forms: [&RegistrationForm; 2],
    settle_ms: u64,
) -> Result<[PageState; 2]> {
    let [first, second] = pages;

    open_register(ctx, first.as_ref()).await?;
    open_register(ctx, second.as_ref()).await?;
    fill_registration(first.as_ref(), forms[0]).await?;
    fill_registration(second.as_ref(), forms[1]).await?;

    let a = {
        let page = first.clone();
        tokio::spawn(async move { page.click(&submit_button()).await })
    };
    let b = {
        let page = second.clone();
        tokio::spawn(async move { page.click(&submit_button()).await })
    };
    let (a, b) = tokio::join!(a, b);
    a??;
    b??;

    ctx.pause(settle_ms).await;
    ctx.wait_for(first.as_ref(), &OutcomeSet::registration()).await;
    ctx.wait_for(second.as_ref(), &OutcomeSet::registration()).await;

    Ok([
        PageState::read(first.as_ref()).await?,
        PageState::read(second.as_ref()).await?,
    ])
}

/// Surrounding whitespace in the email is trimmed, not rejected
pub struct EmailSpaces;

#[async_trait]
impl Scenario for EmailSpaces {
    fn name(&self) -> &'static str {
        "REG-060 - Email with Leading/Trailing Spaces"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let username = format!("user070_{}", ctx.stamp);

        for email in spaced_emails(ctx.stamp) {
            let form = RegistrationForm::new(username.as_str(), email.as_str(), PASSWORD);
            let state = register(ctx, &form).await?;

            if state.accepted() {
                info!("Email with spaces accepted (trimmed): {}", email.trim());
            } else {
                ctx.capture("REG060_space_rejected").await;
                return Ok(Verdict::fail("Email with spaces was rejected (should trim)")
                    .with_severity("MEDIUM"));
            }
        }

        Ok(Verdict::pass("Email spaces consistently trimmed and accepted"))
    }
}

pub struct EmailCaseDuplicate;

#[async_trait]
impl Scenario for EmailCaseDuplicate {
    fn name(&self) -> &'static str {
        "REG-061 - Email Case Insensitive Duplicate Handling"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let first = RegistrationForm::new(
            "user071_first",
            format!("CaseTest{}@Gmail.com", ctx.stamp),
            PASSWORD,
        );
        let state = register(ctx, &first).await?;
        if !(state.url.contains(SUCCESS_MARKER) && state.has("sign in")) {
            return Ok(Verdict::fail("First registration failed"));
        }

        let second = RegistrationForm::new(
            "user071_duplicate",
            format!("casetest{}@gmail.com", ctx.stamp),
            PASSWORD,
        );
        let state = register(ctx, &second).await?;
        if state.is_duplicate() || state.has("warning") {
            Ok(Verdict::pass("Email case-insensitive duplicate correctly blocked"))
        } else {
            ctx.capture("REG061_case_bypass").await;
            Ok(Verdict::fail("CRITICAL: Email case sensitivity bypass!").with_severity("CRITICAL"))
        }
    }
}

/// Backend validation holds when the email field is set by script
pub struct FrontendBypass;

const BYPASS_EMAIL: &str = "bypass@evil.com";

#[async_trait]
impl Scenario for FrontendBypass {
    fn name(&self) -> &'static str {
        "REG-062 - Bypass Frontend Validation with JS Injection"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        open_register(ctx, page.as_ref()).await?;

        let script = format!(
            "() => {{ const el = document.getElementsByName('email')[0]; el.value = '{}'; el.dispatchEvent(new Event('input', {{ bubbles: true }})); }}",
            BYPASS_EMAIL
        );
        page.execute_script(&script).await?;

        page.type_text(&field("username"), &format!("bypass{}", ctx.stamp))
            .await?;
        page.type_text(&field("password"), "Weak1").await?;
        page.type_text(&field("confirmPassword"), "Weak1").await?;
        accept_terms(page.as_ref()).await?;
        submit(page.as_ref()).await?;

        ctx.wait_for(page.as_ref(), &OutcomeSet::registration()).await;
        let state = PageState::read(page.as_ref()).await?;

        if state.accepted() {
            ctx.capture("REG062_BYPASS_SUCCESS").await;
            Ok(Verdict::fail(
                "CRITICAL: Frontend validation bypassed AND backend accepted weak/invalid data!",
            )
            .with_severity("CRITICAL"))
        } else {
            Ok(Verdict::pass(
                "Backend correctly rejected even when frontend was bypassed",
            ))
        }
    }
}

/// A password registered with surrounding spaces still logs in trimmed
pub struct PasswordSpaces;

#[async_trait]
impl Scenario for PasswordSpaces {
    fn name(&self) -> &'static str {
        "REG-063 - Password Leading/Trailing Spaces Handling"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let email = format!("pwdspace{}@test.com", ctx.stamp);
        let form = RegistrationForm::new(
            format!("user073_{}", ctx.stamp),
            email.as_str(),
            &format!("  {}  ", PASSWORD),
        );
        let state = register(ctx, &form).await?;
        if !(state.url.contains(SUCCESS_MARKER) && state.has("sign in")) {
            return Ok(Verdict::fail("Registration failed with spaced password"));
        }

        let page = ctx.page();
        open_login(ctx, page.as_ref()).await?;
        submit_login(page.as_ref(), &email, PASSWORD).await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::sign_in()).await;

        let state = PageState::read(page.as_ref()).await?;
        if state.url.contains("/welcome.jsp") {
            Ok(Verdict::pass(
                "Password spaces trimmed consistently (register & login)",
            ))
        } else {
            ctx.capture("REG063_space_login_fail").await;
            Ok(Verdict::fail("Password spaces NOT trimmed → login failed").with_severity("HIGH"))
        }
    }
}

/// Username and email survive a rejected submit
pub struct FormStateRetention;

#[async_trait]
impl Scenario for FormStateRetention {
    fn name(&self) -> &'static str {
        "REG-064 - Form State Retention After Validation Error"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        let form = RegistrationForm::new(
            format!("user074_{}", ctx.stamp),
            format!("state{}@test.com", ctx.stamp),
            "weak",
        );

        open_register(ctx, page.as_ref()).await?;
        fill_registration(page.as_ref(), &form).await?;
        submit(page.as_ref()).await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::registration()).await;

        for name in ["password", "confirmPassword"] {
            page.clear(&field(name)).await?;
            page.type_text(&field(name), "again").await?;
        }
        submit(page.as_ref()).await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::registration()).await;

        let username = probe_value(page.as_ref(), &field("username"), Presence::Required).await?;
        let email = probe_value(page.as_ref(), &field("email"), Presence::Required).await?;
        if username.is_unexpected() || email.is_unexpected() {
            warn!("Username/email fields not found after validation error - likely page refreshed");
        }

        let retained = username == Probe::Present(form.username.clone())
            && email == Probe::Present(form.email.clone());
        if retained {
            Ok(Verdict::pass("Form state correctly retained after error"))
        } else {
            ctx.capture("REG064_state_lost").await;
            Ok(Verdict::fail("Form data lost after validation error"))
        }
    }
}

pub struct DoubleClickSubmit;

#[async_trait]
impl Scenario for DoubleClickSubmit {
    fn name(&self) -> &'static str {
        "REG-066 - Double-Click Register Button Protection"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let page = ctx.page();
        let email = format!("double{}@test.com", ctx.stamp);
        let form = RegistrationForm::new(format!("user076_{}", ctx.stamp), email.as_str(), PASSWORD);

        open_register(ctx, page.as_ref()).await?;
        fill_registration(page.as_ref(), &form).await?;
        page.double_click(&submit_button()).await?;
        ctx.wait_for(page.as_ref(), &OutcomeSet::registration()).await;

        let check = RegistrationForm::new("duplicate_check", email.as_str(), PASSWORD);
        let state = register(ctx, &check).await?;
        if state.is_duplicate() {
            Ok(Verdict::pass("Double-click prevented → only one account created"))
        } else {
            ctx.capture("REG066_DOUBLE_SUCCESS").await;
            Ok(
                Verdict::fail("CRITICAL: Double submission created duplicate account!")
                    .with_severity("CRITICAL"),
            )
        }
    }
}

/// Two tabs racing on one email: exactly one may win
pub struct ConcurrentSameEmail;

#[async_trait]
impl Scenario for ConcurrentSameEmail {
    fn name(&self) -> &'static str {
        "REG-067 - Concurrent registration with same email in two tabs"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let email = format!("race{}@test.com", ctx.stamp);
        let a = RegistrationForm::new(format!("user067A_{}", ctx.stamp), email.as_str(), PASSWORD);
        let b = RegistrationForm::new(format!("user067B_{}", ctx.stamp), email.as_str(), PASSWORD);

        let states = race_registration(ctx, [&a, &b], 0).await?;
        let successes = states.iter().filter(|s| s.accepted()).count();
        info!("Same-email race: {} tab(s) succeeded", successes);

        if successes != 1 {
            ctx.capture("REG067_BOTH_SUCCESS_OR_NONE").await;
            return Ok(Verdict::fail(format!(
                "Race condition error: {} tabs succeeded (expected exactly 1)",
                successes
            ))
            .with_severity("CRITICAL"));
        }

        let check = RegistrationForm::new("check_duplicate", email.as_str(), PASSWORD);
        let state = register(ctx, &check).await?;
        if state.is_duplicate() {
            Ok(Verdict::pass(
                "Race condition handled correctly: only one account created despite concurrent requests",
            ))
        } else {
            ctx.capture("REG067_DUPLICATE_ALLOWED").await;
            Ok(
                Verdict::fail("CRITICAL: Duplicate account created due to race condition!")
                    .with_severity("CRITICAL"),
            )
        }
    }
}

/// Two tabs registering different emails at once: both must persist
pub struct ConcurrentDifferentAccounts;

#[async_trait]
impl Scenario for ConcurrentDifferentAccounts {
    fn name(&self) -> &'static str {
        "REG-068 - Concurrent registration of different accounts in parallel tabs"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let emails = [
            format!("para{}a@test.com", ctx.stamp),
            format!("para{}b@test.com", ctx.stamp),
        ];
        let a = RegistrationForm::new(format!("user068A_{}", ctx.stamp), emails[0].as_str(), PASSWORD);
        let b = RegistrationForm::new(format!("user068B_{}", ctx.stamp), emails[1].as_str(), PASSWORD);

        let states = race_registration(ctx, [&a, &b], ctx.config.race_settle_ms).await?;
        if !states.iter().all(|s| s.accepted()) {
            ctx.capture("REG068_ONE_OR_BOTH_FAILED").await;
            return Ok(Verdict::fail(
                "Concurrent registration of different accounts failed - at least one did not succeed",
            ));
        }

        let mut not_persisted = 0;
        for email in &emails {
            let check = RegistrationForm::new("dup_check", email.as_str(), PASSWORD);
            if !register(ctx, &check).await?.is_duplicate() {
                warn!("Account {} not found on follow-up registration", email);
                not_persisted += 1;
            }
        }

        if not_persisted == 0 {
            Ok(Verdict::pass(
                "Two different accounts successfully registered concurrently, no interference",
            ))
        } else {
            ctx.capture("REG068_ONE_NOT_PERSISTED").await;
            Ok(Verdict::fail(format!(
                "{} account(s) not actually persisted despite success message",
                not_persisted
            )))
        }
    }
}
