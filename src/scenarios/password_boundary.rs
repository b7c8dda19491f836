//! Password length boundary checks around MIN=3 and MAX=25

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serde_json::{json, Value};

use super::forms::{register, PageState, RegistrationForm};
use super::{Scenario, ScenarioGroup};
use crate::runner::context::ScenarioContext;
use crate::runner::state::Verdict;

pub fn group() -> ScenarioGroup {
    ScenarioGroup {
        name: "password-boundary",
        title: "Password Length Boundary",
        fixture: None,
        scenarios: vec![Box::new(PasswordLengthBoundaries)],
    }
}

/// How the application treated one submitted password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthOutcome {
    Accept,
    Reject,
    Unknown,
}

impl LengthOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthOutcome::Accept => "ACCEPT",
            LengthOutcome::Reject => "REJECT",
            LengthOutcome::Unknown => "UNKNOWN",
        }
    }
}

struct BoundaryCase {
    length: usize,
    desc: &'static str,
    expected: LengthOutcome,
}

const CASES: [BoundaryCase; 5] = [
    BoundaryCase {
        length: 2,
        desc: "MIN-1 (2 chars)",
        expected: LengthOutcome::Reject,
    },
    BoundaryCase {
        length: 3,
        desc: "MIN (3 chars)",
        expected: LengthOutcome::Accept,
    },
    BoundaryCase {
        length: 10,
        desc: "Normal (10 chars)",
        expected: LengthOutcome::Accept,
    },
    BoundaryCase {
        length: 25,
        desc: "MAX (25 chars)",
        expected: LengthOutcome::Accept,
    },
    BoundaryCase {
        length: 26,
        desc: "MAX+1 (26 chars)",
        expected: LengthOutcome::Reject,
    },
];

/// Password of exactly `length` chars holding upper, lower and digit once long enough
pub fn boundary_password(length: usize) -> String {
    const BASE: &str = "Ab1";
    if length < BASE.len() {
        return BASE[..length].to_string();
    }
    format!("{}{}", BASE, "x".repeat(length - BASE.len()))
}

fn has_password_message(state: &PageState) -> bool {
    state.has("invalid password") || state.has("≤ 25 characters")
}

pub fn classify(state: &PageState, register_url: &str) -> LengthOutcome {
    if state.accepted() {
        LengthOutcome::Accept
    } else if has_password_message(state) || state.on_register_page(register_url) {
        LengthOutcome::Reject
    } else {
        LengthOutcome::Unknown
    }
}

pub struct PasswordLengthBoundaries;

#[async_trait]
impl Scenario for PasswordLengthBoundaries {
    fn name(&self) -> &'static str {
        "REG-030 - Password Length Boundaries (MIN=3, MAX=25)"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict> {
        let register_url = ctx.config.register_url();
        let mut failed_cases: Vec<Value> = Vec::new();

        for case in &CASES {
            let password = boundary_password(case.length);
            let form = RegistrationForm::new(
                format!("user030_{}_{}", ctx.stamp, case.length),
                format!("reg030_{}_{}@test.com", ctx.stamp, case.length),
                &password,
            );

            let state = match register(ctx, &form).await {
                Ok(state) => state,
                Err(e) => {
                    error!("Exception on length {}: {:#}", case.length, e);
                    ctx.capture(&format!("REG030_EXCEPTION_length_{}", case.length))
                        .await;
                    failed_cases.push(json!({ "length": case.length, "error": format!("{:#}", e) }));
                    continue;
                }
            };

            let actual = classify(&state, &register_url);
            if actual == case.expected {
                info!("PASS: {} -> {}", case.desc, actual.as_str());
                continue;
            }

            error!(
                "FAIL: {} | Expected: {} | Actual: {}",
                case.desc,
                case.expected.as_str(),
                actual.as_str()
            );
            ctx.capture(&format!("REG030_FAIL_length_{}", case.length))
                .await;
            failed_cases.push(json!({
                "length": case.length,
                "password": password,
                "expected": case.expected.as_str(),
                "actual": actual.as_str(),
                "url": state.url,
                "has_error_msg": state.has("invalid password"),
            }));
        }

        if failed_cases.is_empty() {
            Ok(Verdict::pass(
                "All password length boundary tests passed | MIN=3, MAX=25 enforced correctly",
            ))
        } else {
            Ok(Verdict::fail(format!(
                "{}/{} boundary tests failed!",
                failed_cases.len(),
                CASES.len()
            ))
            .with_details(json!({ "severity": "HIGH", "failed_cases": failed_cases })))
        }
    }
}
