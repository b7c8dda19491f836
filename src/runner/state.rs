use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Instant;

/// Terminal verdict of one scenario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Warn,
    Skip,
    Error,
}

impl Status {
    /// Binary split used by the tally: only PASS counts as passed.
    pub fn counts_as_passed(self) -> bool {
        matches!(self, Status::Pass)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Warn => "WARN",
            Status::Skip => "SKIP",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a scenario concluded, before it is recorded
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
    /// Bug details; only kept for non-PASS verdicts
    pub details: Option<Map<String, Value>>,
}

impl Verdict {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Status::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Status::Fail, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Status::Warn, message)
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(Status::Skip, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    /// Attach bug details. Non-object values are stored under `"value"`.
    pub fn with_details(mut self, details: Value) -> Self {
        let map = match details {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.details = Some(map);
        self
    }

    /// Shorthand for a details map holding only a severity tag
    pub fn with_severity(self, severity: &str) -> Self {
        self.with_details(serde_json::json!({ "severity": severity }))
    }
}

/// Lifecycle of a scenario inside a group run
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStatus {
    NotRun,
    Running,
    Finished(Status),
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScenarioStatus::Finished(_))
    }
}

/// Tracks one scenario from start to verdict
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub name: String,
    pub status: ScenarioStatus,
    started_at: Option<Instant>,
    pub duration_ms: Option<u64>,
}

impl ScenarioState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ScenarioStatus::NotRun,
            started_at: None,
            duration_ms: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    /// Move to a terminal state. Finishing twice keeps the first verdict.
    pub fn finish(&mut self, status: Status) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ScenarioStatus::Finished(status);
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }
}
