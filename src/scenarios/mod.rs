//! Scenario groups run against the application under test.
//!
//! Each group is an ordered list of scenarios sharing one browser session.
//! A scenario returns exactly one [`Verdict`]; an `Err` is turned into an
//! ERROR verdict by the group runner.

pub mod email_validation;
pub mod forms;
pub mod input_normalization;
pub mod login_security;
pub mod login_validation;
pub mod password_boundary;
pub mod special_input;


use anyhow::Result;
use async_trait::async_trait;

use crate::runner::context::ScenarioContext;
use crate::runner::state::Verdict;

/// One independently-verdicted behavioral check
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Name recorded in the report
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> Result<Verdict>;
}

/// Setup step that prepares shared data for a group. Never produces a verdict.
#[async_trait]
pub trait Fixture: Send + Sync {
    fn name(&self) -> &'static str;

    async fn prepare(&self, ctx: &mut ScenarioContext<'_>);
}

pub struct ScenarioGroup {
    /// Identifier accepted by `--group`
    pub name: &'static str,
    pub title: &'static str,
    pub fixture: Option<Box<dyn Fixture>>,
    pub scenarios: Vec<Box<dyn Scenario>>,
}

impl ScenarioGroup {
    pub fn scenario_names(&self) -> Vec<&'static str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }
}

/// Every group in run order: registration groups first, then login groups
pub fn all_groups() -> Vec<ScenarioGroup> {
    vec![
        email_validation::group(),
        input_normalization::group(),
        password_boundary::group(),
        special_input::group(),
        login_validation::group(),
        login_security::group(),
    ]
}

/// Groups whose name is in `filter`, in run order; all groups when empty
pub fn select_groups(filter: &[String]) -> Result<Vec<ScenarioGroup>> {
    let groups = all_groups();
    if filter.is_empty() {
        return Ok(groups);
    }

    let known: Vec<&str> = groups.iter().map(|g| g.name).collect();
    if let Some(unknown) = filter.iter().find(|f| !known.contains(&f.as_str())) {
        anyhow::bail!(
            "Unknown group: {} (available: {})",
            unknown,
            known.join(", ")
        );
    }

    Ok(groups
        .into_iter()
        .filter(|g| filter.iter().any(|f| f == g.name))
        .collect())
}
