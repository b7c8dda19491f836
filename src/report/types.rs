use crate::runner::state::{Status, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One recorded scenario verdict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub status: Status,
    pub message: String,
    pub timestamp: String,
}

/// Structured bug entry for a non-PASS verdict that carried details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BugRecord {
    pub test_name: String,
    pub description: String,
    pub details: Map<String, Value>,
    pub timestamp: String,
}

impl BugRecord {
    pub fn severity(&self) -> Severity {
        Severity::from_details(&self.details)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Unknown,
}

impl Severity {
    pub fn from_details(details: &Map<String, Value>) -> Self {
        match details.get("severity").and_then(Value::as_str) {
            Some("CRITICAL") => Severity::Critical,
            Some("HIGH") => Severity::High,
            Some("MEDIUM") => Severity::Medium,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

/// Run-wide counters and records, serialized as the final report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultTally {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub bugs: Vec<BugRecord>,
    pub test_cases: Vec<TestOutcome>,
}

impl ResultTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verdict under `name`
    pub fn record(&mut self, name: &str, verdict: &Verdict) -> &TestOutcome {
        let timestamp = now_iso();
        self.total += 1;
        if verdict.status.counts_as_passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
            if let Some(details) = verdict.details.as_ref().filter(|d| !d.is_empty()) {
                self.bugs.push(BugRecord {
                    test_name: name.to_string(),
                    description: verdict.message.clone(),
                    details: details.clone(),
                    timestamp: timestamp.clone(),
                });
            }
        }

        self.test_cases.push(TestOutcome {
            name: name.to_string(),
            status: verdict.status,
            message: verdict.message.clone(),
            timestamp,
        });
        &self.test_cases[self.test_cases.len() - 1]
    }

    /// Percentage of passed verdicts, 0 for an empty run
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Keep alphanumerics and ` _-()`, replace everything else with `_`
pub fn sanitize_label(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || " _-()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Evidence label for a non-PASS verdict
pub fn failure_label(status: Status, name: &str) -> String {
    format!("{}_{}", status, sanitize_label(name))
}

pub(crate) fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
