pub mod evidence;
pub mod json;
pub mod types;

pub use evidence::EvidenceStore;
pub use json::{finalize, load, print_summary};
pub use types::{failure_label, sanitize_label, BugRecord, ResultTally, Severity, TestOutcome};

use anyhow::Result;
use std::path::Path;

/// Reload a saved report and print its summary
pub fn summarize_report(path: &Path) -> Result<()> {
    let tally = load(path)?;
    print_summary(&tally);
    Ok(())
}
