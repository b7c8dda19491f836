//! Hostile password characters and oversized usernames

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::json;

use super::forms::{page_timed_out, register, RegistrationForm, SUCCESS_MARKER};
use super::{Scenario, ScenarioGroup};
use crate::runner::context::ScenarioContext;
use crate::runner::state::Verdict;

const DANGEROUS_PASSWORDS: [&str; 9] = [
    "Test123中文",
    "Test123😈🔥",
    "Test123\n\r\t",
    "Test123' OR '1'='1",
    "Test123\"; DROP TABLE users;--",
    "Test123<script>alert(1)</script>",
    "Test123%$#&*()_+",
    "Test123ａｂｃ１２３",
    "Test123\u{200B}\u{2060}",
];

const USERNAME_LENGTHS: [(char, usize); 4] = [('A', 200), ('B', 500), ('C', 1000), ('X', 2000)];

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "special-input",
        title: "Boundary & Special Input",
        fixture: None,
        scenarios: vec![
            Box::new(PasswordSpecialCharacters),
            Box::new(ExcessiveUsernameLength),
        ],
    }
}

/// `input` as typed, with only control characters escaped
fn printable(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_control() {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

pub struct PasswordSpecialCharacters;

impl PasswordSpecialCharacters {
    async fn crashed(ctx: &ScenarioContext<'_>, password: &str) -> Verdict {
        let prefix: String = password.chars().take(10).collect();
        ctx.capture(&format!("REG014_CRITICAL_{}", prefix)).await;
        Verdict::fail(format!(
            "CRITICAL: System crashed or vulnerable with password: {}",
            printable(password)
        ))
        .with_details(json!({ "severity": "CRITICAL", "input": password }))
    }
}

#[async_trait]
impl Scenario for PasswordSpecialCharacters {
    fn name(&self) -> &'static str {
        "REG-014 - Password Field Illegal & Special Characters Handling"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        for (i, password) in DANGEROUS_PASSWORDS.iter().enumerate() {
            let form = RegistrationForm::new(
                format!("user_{}_{}", ctx.stamp, i),
                format!("reg014_{}_{}@test.com", ctx.stamp, i),
                password,
            );
            let escaped = printable(password);

            let state = match register(ctx, &form).await {
                Ok(state) => state,
                Err(e) => {
                    error!("Submitting password {} failed: {:#}", escaped, e);
                    return Ok(Self::crashed(ctx, password).await);
                }
            };

            if state.accepted() {
                info!("Password with special chars accepted: {}", escaped);
            } else if state.has("invalid password") || state.has("password must include") {
                info!("Password correctly blocked by frontend: {}", escaped);
            } else if state.backend_rejected() {
                info!("Password blocked by backend (safe): {}", escaped);
            } else if state.crashed(false) {
                return Ok(Self::crashed(ctx, password).await);
            } else {
                debug!("Password {} left the page in an unclassified state", escaped);
            }
        }

        Ok(Verdict::pass(format!(
            "All {} dangerous passwords were safely handled (accepted or rejected cleanly)",
            DANGEROUS_PASSWORDS.len()
        )))
    }
}

pub struct ExcessiveUsernameLength;

#[async_trait]
impl Scenario for ExcessiveUsernameLength {
    fn name(&self) -> &'static str {
        "REG-016 - Excessive Username Length Boundary Test"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let register_url = ctx.config.register_url();

        for (fill, len) in USERNAME_LENGTHS {
            let form = RegistrationForm::new(
                fill.to_string().repeat(len),
                format!("reg016_{}_{}@test.com", ctx.stamp, len),
                "Test1234abcd",
            );

            let state = match register(ctx, &form).await {
                Ok(state) => state,
                Err(e) if page_timed_out(&e) => {
                    ctx.capture(&format!("REG016_TIMEOUT_{}chars", len)).await;
                    return Ok(Verdict::fail(format!(
                        "Timeout - likely server crashed with {}-char username",
                        len
                    ))
                    .with_details(json!({ "severity": "CRITICAL" })));
                }
                Err(e) => {
                    ctx.capture(&format!("REG016_ERROR_{}chars", len)).await;
                    return Ok(Verdict::fail(format!("Exception with {} chars: {:#}", len, e)));
                }
            };

            if state.url.contains(&register_url)
                && (state.url.contains("error") || state.has("⚠️"))
            {
                info!("Long username ({} chars) correctly blocked", len);
            } else if state.url.contains(SUCCESS_MARKER) {
                warn!("Long username ({} chars) accepted (possibly truncated)", len);
            } else if state.crashed(true) {
                ctx.capture(&format!("REG016_CRASH_{}chars", len)).await;
                return Ok(Verdict::fail(format!(
                    "CRITICAL: Server crashed with {}-char username!",
                    len
                ))
                .with_details(json!({ "severity": "CRITICAL", "length": len })));
            }
        }

        Ok(Verdict::pass(
            "System safely handled extremely long usernames (200~2000 chars) - no crash or corruption",
        ))
    }
}
