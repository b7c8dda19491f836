use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use std::path::{Path, PathBuf};

use super::types::ResultTally;
use crate::error::HarnessError;

/// Log the summary and bug list, then write `FINAL_REPORT_{ts}.json` into `dir`
pub fn finalize(tally: &ResultTally, dir: &Path) -> Result<PathBuf> {
    info!("{}", "=".repeat(70));
    info!("           FINAL AUTOMATED TEST REPORT");
    info!("{}", "=".repeat(70));
    info!("Total Tests : {}", tally.total);
    info!("Passed      : {}", tally.passed);
    info!("Failed      : {}", tally.failed);
    info!("Pass Rate   : {:.2}%", tally.pass_rate());

    if tally.bugs.is_empty() {
        info!("All tests PASSED! No critical bugs found!");
    } else {
        warn!("Found {} BUG(s):", tally.bugs.len());
        for (i, bug) in tally.bugs.iter().enumerate() {
            warn!(
                "  [{}] BUG #{}: {} -> {}",
                bug.severity().as_str(),
                i + 1,
                bug.test_name,
                bug.description
            );
        }
    }

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("FINAL_REPORT_{}.json", stamp));
    write(tally, &path)?;

    info!("Final report saved: {}", path.display());
    info!("{}", "=".repeat(70));
    Ok(path)
}

fn write(tally: &ResultTally, path: &Path) -> Result<()> {
    let report_error = |reason: String| HarnessError::Report {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| report_error(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(tally).map_err(|e| report_error(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| report_error(e.to_string()))?;
    Ok(())
}

/// Read a report written by [`finalize`]
pub fn load(path: &Path) -> Result<ResultTally> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    let tally: ResultTally = serde_json::from_str(&content)
        .with_context(|| format!("Invalid report format in {}", path.display()))?;
    Ok(tally)
}

/// Print a colored summary block and bug list to stdout
pub fn print_summary(tally: &ResultTally) {
    println!("\n{} Test run finished", "■".blue().bold());
    println!("  Total tests: {}", tally.total);
    println!("  {} {}", "Passed:".green(), tally.passed);
    println!("  {} {}", "Failed:".red(), tally.failed);
    println!("  Pass rate: {:.2}%", tally.pass_rate());

    if tally.bugs.is_empty() {
        println!("\n{} No bugs recorded", "✓".green().bold());
        return;
    }

    println!("\n{} {} bug(s):", "⚠".yellow().bold(), tally.bugs.len());
    for (i, bug) in tally.bugs.iter().enumerate() {
        let severity = bug.severity().as_str();
        let tag = match severity {
            "CRITICAL" => severity.red().bold(),
            "HIGH" => severity.red(),
            "MEDIUM" => severity.yellow(),
            _ => severity.dimmed(),
        };
        println!(
            "  [{}] #{} {} -> {}",
            tag,
            i + 1,
            bug.test_name.cyan(),
            bug.description
        );
    }
}
