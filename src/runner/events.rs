use super::state::Status;
use crate::report::{print_summary, ResultTally};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Harness progress events for real-time console output
#[derive(Debug, Clone)]
pub enum HarnessEvent {
    // Run events
    RunStarted {
        run_id: String,
        group_count: usize,
    },
    RunFinished {
        summary: ResultTally,
        report_path: Option<PathBuf>,
    },

    // Group events
    GroupStarted {
        group: String,
        title: String,
        scenario_count: usize,
    },
    GroupSkipped {
        group: String,
        reason: String,
    },
    GroupFinished {
        group: String,
        passed: usize,
        failed: usize,
    },

    // Scenario events
    ScenarioStarted {
        group: String,
        name: String,
    },
    ScenarioFinished {
        group: String,
        name: String,
        status: Status,
        message: String,
        duration_ms: u64,
    },
}

/// Event emitter for broadcasting harness events
pub struct EventEmitter {
    sender: broadcast::Sender<HarnessEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<HarnessEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: HarnessEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HarnessEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    /// Print events until every emitter is dropped
    pub async fn listen(mut receiver: broadcast::Receiver<HarnessEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::print(&event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    fn print(event: &HarnessEvent) {
        use colored::Colorize;

        match event {
            HarnessEvent::RunStarted {
                run_id,
                group_count,
            } => {
                println!(
                    "\n{} Test run started: {} ({} groups)",
                    "▶".green().bold(),
                    run_id.cyan(),
                    group_count
                );
            }

            HarnessEvent::GroupStarted {
                title,
                scenario_count,
                ..
            } => {
                println!(
                    "\n  {} Group: {} ({} scenarios)",
                    "→".blue(),
                    title.white().bold(),
                    scenario_count
                );
            }

            HarnessEvent::GroupSkipped { group, reason } => {
                println!(
                    "  {} Group {} skipped: {}",
                    "○".yellow(),
                    group,
                    reason.dimmed()
                );
            }

            HarnessEvent::GroupFinished {
                group,
                passed,
                failed,
            } => {
                println!(
                    "  {} Group {} [{} passed, {} failed]",
                    "←".blue(),
                    group,
                    passed.to_string().green(),
                    failed.to_string().red()
                );
            }

            HarnessEvent::ScenarioStarted { name, .. } => {
                println!("      {} {}...", "•".dimmed(), name.dimmed());
            }

            HarnessEvent::ScenarioFinished {
                name,
                status,
                message,
                duration_ms,
                ..
            } => {
                let tag = match status {
                    Status::Pass => "✓ PASS".green().bold(),
                    Status::Fail => "✗ FAIL".red().bold(),
                    Status::Error => "✗ ERROR".red(),
                    Status::Warn => "! WARN".yellow().bold(),
                    Status::Skip => "○ SKIP".yellow(),
                };
                println!("    {} {} ({}ms)", tag, name, duration_ms);
                if *status != Status::Pass {
                    println!("        {}", message.dimmed());
                }
            }

            HarnessEvent::RunFinished {
                summary,
                report_path,
            } => {
                print_summary(summary);
                if let Some(path) = report_path {
                    println!("\n  Report: {}", path.display().to_string().cyan());
                }
            }
        }
    }
}
