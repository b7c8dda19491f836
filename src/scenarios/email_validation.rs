//! Registration scenarios for email format handling

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::json;

use super::forms::{page_timed_out, register, RegistrationForm, SUCCESS_MARKER};
use super::{Scenario, ScenarioGroup};
use crate::runner::context::ScenarioContext;
use crate::runner::state::Verdict;

const PASSWORD: &str = "Test1234abcd";

const INVALID_EMAILS: [&str; 14] = [
    "plainaddress",
    "@missingusername.com",
    "user1name@.com",
    "user1name@com",
    "user1@name@domain.com",
    "user1 name@domain.com",
    "user1<name@domain.com",
    "user1@domain..com",
    "user1@domain.c",
    "user1@-domain.com",
    "user1@domain-.com",
    "user1@.domain.com",
    "user1@domain_com",
    "user1@domain#com",
];

const VALID_EMAILS: [&str; 10] = [
    "user+tag@gmail.com",
    "user.name+tag@sub.domain.co.uk",
    "user@sub.domain.com",
    "user123@domain.travel",
    "user@domain.museum",
    "user@12domain.com",
    "user@domain-with-dash.com",
    "user@domain_with_underscore.com",
    "user@xn--80asehdb.com",
    "user@localhost",
];

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "email-validation",
        title: "Email Validation",
        fixture: None,
        scenarios: vec![
            Box::new(InvalidEmailFormats),
            Box::new(ExcessiveEmailLength),
            Box::new(ValidEmailVariants),
        ],
    }
}

fn long_emails() -> Vec<String> {
    vec![
        format!("{}@longemail.com", "a".repeat(200)),
        format!("{}@veryveryverylongdomain.com", "b".repeat(240)),
        format!(
            "{}@thisdomainiswaytoolongandshouldberejectedbyanydecentemailvalidator.com",
            "x".repeat(300)
        ),
    ]
}

/// Malformed addresses must never get past registration
pub struct InvalidEmailFormats;

#[async_trait]
impl Scenario for InvalidEmailFormats {
    fn name(&self) -> &'static str {
        "REG-020 - Invalid Email Formats"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let register_url = ctx.config.register_url();
        let username = format!("user020_{}", ctx.stamp);
        let mut accepted = Vec::new();

        for email in INVALID_EMAILS {
            let form = RegistrationForm::new(username.as_str(), email, PASSWORD);
            let state = register(ctx, &form).await?;

            if state.on_register_page(&register_url) {
                info!("Blocked invalid email: {}", email);
            } else if state.url.contains(SUCCESS_MARKER) {
                error!("CRITICAL: Invalid email accepted: {}", email);
                let prefix: String = email.chars().take(20).collect();
                ctx.capture(&format!("REG020_BYPASS_{}", prefix)).await;
                accepted.push(email.to_string());
            } else {
                debug!("Invalid email {} left the page at {}", email, state.url);
            }
        }

        if accepted.is_empty() {
            Ok(Verdict::pass(format!(
                "All {} invalid emails were correctly rejected",
                INVALID_EMAILS.len()
            )))
        } else {
            Ok(
                Verdict::fail(format!("{} invalid emails were accepted!", accepted.len()))
                    .with_details(json!({ "severity": "HIGH", "accepted": accepted })),
            )
        }
    }
}

/// Very long addresses are rejected or truncated, never a server fault
pub struct ExcessiveEmailLength;

#[async_trait]
impl Scenario for ExcessiveEmailLength {
    fn name(&self) -> &'static str {
        "REG-021 - Excessive Email Length Boundary Test"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let register_url = ctx.config.register_url();

        for email in long_emails() {
            let len = email.chars().count();
            let form = RegistrationForm::new(format!("user021_{}_{}", ctx.stamp, len), email, PASSWORD);
            let state = match register(ctx, &form).await {
                Ok(state) => state,
                Err(e) if page_timed_out(&e) => {
                    ctx.capture(&format!("REG021_TIMEOUT_{}chars", len)).await;
                    return Ok(Verdict::fail("Timeout - server likely crashed"));
                }
                Err(e) => return Err(e),
            };

            if state.on_register_page(&register_url) {
                info!("{}-char email blocked", len);
                continue;
            }
            if state.accepted() {
                info!("{}-char email accepted (likely truncated)", len);
                continue;
            }
            if state.crashed(false) {
                ctx.capture(&format!("REG021_CRASH_{}chars", len)).await;
                return Ok(Verdict::fail(format!(
                    "CRITICAL: Server crashed with {}-char email!",
                    len
                ))
                .with_details(json!({ "severity": "CRITICAL", "email_length": len })));
            }
        }

        Ok(Verdict::pass(
            "System safely handled extremely long emails (200~300+ chars) - no crash",
        ))
    }
}

/// Unusual but valid addresses should be accepted
pub struct ValidEmailVariants;

#[async_trait]
impl Scenario for ValidEmailVariants {
    fn name(&self) -> &'static str {
        "REG-022 - Valid Email Format Variants"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let mut rejected = Vec::new();

        for (i, email) in VALID_EMAILS.iter().enumerate() {
            let form = RegistrationForm::new(format!("user022_{}_{}", ctx.stamp, i), *email, PASSWORD);
            let state = register(ctx, &form).await?;

            if state.accepted() || state.is_duplicate() {
                info!("Valid email handled: {}", email);
            } else {
                warn!("Valid email rejected: {}", email);
                rejected.push(email.to_string());
            }
        }

        if rejected.is_empty() {
            Ok(Verdict::pass("All valid email variants were accepted"))
        } else {
            Ok(Verdict::warn(format!(
                "{} valid emails were unexpectedly rejected",
                rejected.len()
            ))
            .with_details(json!({ "rejected": rejected })))
        }
    }
}
