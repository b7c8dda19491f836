pub mod context;
pub mod events;
pub mod probe;
pub mod session;
pub mod state;
pub mod wait;

use anyhow::Result;
use log::{error, info, warn};
use std::path::PathBuf;

pub use events::*;
pub use state::*;

use crate::driver::BrowserLauncher;
use crate::error::HarnessError;
use crate::report::{self, failure_label, ResultTally};
use crate::scenarios::{Scenario, ScenarioGroup};
use crate::utils::config::Config;
use context::ScenarioContext;
use session::Session;

/// Run every group in order, then write the final report.
///
/// Returns the tally and the report path. Group failures never abort the run;
/// only a report that cannot be written is an error.
pub async fn run_harness(
    config: &Config,
    launcher: &dyn BrowserLauncher,
    groups: &[ScenarioGroup],
    emitter: &EventEmitter,
) -> Result<(ResultTally, PathBuf)> {
    let run_id = uuid::Uuid::new_v4().to_string();
    info!("Run {} against {}", run_id, config.base_url);
    emitter.emit(HarnessEvent::RunStarted {
        run_id,
        group_count: groups.len(),
    });

    let mut tally = ResultTally::new();
    for group in groups {
        run_group(group, config, launcher, &mut tally, emitter).await;
    }

    match report::finalize(&tally, &config.output_dir) {
        Ok(path) => {
            emitter.emit(HarnessEvent::RunFinished {
                summary: tally.clone(),
                report_path: Some(path.clone()),
            });
            Ok((tally, path))
        }
        Err(e) => {
            emitter.emit(HarnessEvent::RunFinished {
                summary: tally.clone(),
                report_path: None,
            });
            Err(e)
        }
    }
}

/// Run one group on a fresh browser session.
///
/// A session that fails to start skips the whole group. Teardown always runs
/// once the session exists.
pub async fn run_group(
    group: &ScenarioGroup,
    config: &Config,
    launcher: &dyn BrowserLauncher,
    tally: &mut ResultTally,
    emitter: &EventEmitter,
) {
    emitter.emit(HarnessEvent::GroupStarted {
        group: group.name.to_string(),
        title: group.title.to_string(),
        scenario_count: group.scenarios.len(),
    });
    info!("{}", "=".repeat(80));
    info!("STARTING {} TESTS", group.title.to_uppercase());
    info!("{}", "=".repeat(80));

    let session = match Session::setup(launcher, config).await {
        Ok(session) => session,
        Err(e) => {
            error!("Skipping group '{}': {}", group.name, e);
            emitter.emit(HarnessEvent::GroupSkipped {
                group: group.name.to_string(),
                reason: e.to_string(),
            });
            return;
        }
    };

    let mut ctx = ScenarioContext::new(config, &session);
    if let Some(fixture) = &group.fixture {
        info!("Preparing fixture: {}", fixture.name());
        fixture.prepare(&mut ctx).await;
    }

    let (mut passed, mut failed) = (0, 0);
    for scenario in &group.scenarios {
        let status = run_scenario(scenario.as_ref(), group.name, &mut ctx, tally, emitter).await;
        if status.counts_as_passed() {
            passed += 1;
        } else {
            failed += 1;
        }
    }

    session.teardown().await;
    info!("{} TEST SUITE COMPLETED", group.title.to_uppercase());
    emitter.emit(HarnessEvent::GroupFinished {
        group: group.name.to_string(),
        passed,
        failed,
    });
}

async fn run_scenario(
    scenario: &dyn Scenario,
    group: &str,
    ctx: &mut ScenarioContext<'_>,
    tally: &mut ResultTally,
    emitter: &EventEmitter,
) -> Status {
    let name = scenario.name();
    let mut state = ScenarioState::new(name);
    state.start();
    info!("Starting {}", name);
    emitter.emit(HarnessEvent::ScenarioStarted {
        group: group.to_string(),
        name: name.to_string(),
    });

    let verdict = match scenario.run(ctx).await {
        Ok(verdict) => verdict,
        Err(e) => {
            match e.downcast_ref::<HarnessError>() {
                Some(kind) if kind.is_environment() => {
                    error!("{} aborted by environment: {}", name, kind)
                }
                _ => error!("{} raised an error: {:#}", name, e),
            }
            Verdict::error(format!("{:#}", e))
        }
    };
    state.finish(verdict.status);

    let outcome = tally.record(name, &verdict);
    match outcome.status {
        Status::Pass => info!("[PASS] {} - {}", name, outcome.message),
        status => warn!("[{}] {} - {}", status, name, outcome.message),
    }

    if !verdict.status.counts_as_passed() {
        ctx.capture(&failure_label(verdict.status, name)).await;
    }

    emitter.emit(HarnessEvent::ScenarioFinished {
        group: group.to_string(),
        name: name.to_string(),
        status: verdict.status,
        message: verdict.message.clone(),
        duration_ms: state.duration_ms.unwrap_or(0),
    });
    verdict.status
}
