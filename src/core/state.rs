//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// State of a single job instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Not yet dispatched
    Pending,
    /// Dispatched to a worker
    Running,
    /// All steps passed (best-effort failures allowed)
    Succeeded,
    /// A step that was not best-effort failed
    Failed,
    /// A prerequisite job did not succeed; never dispatched
    Blocked,
    /// Job disabled in the workflow; never dispatched
    Skipped,
    /// Stopped by fail-fast before completing
    Cancelled,
}

impl JobStatus {
    /// Check if the instance can no longer change state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Check if this status counts against the run
    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Blocked | JobStatus::Cancelled)
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Record of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Position of the step within its job
    pub index: usize,

    pub name: String,

    pub status: StepStatus,

    /// Failure was tolerated because the step is best-effort
    pub best_effort: bool,

    /// Process exit code, when the command ran to completion
    pub exit_code: Option<i32>,

    /// Captured stdout and stderr
    pub output: String,

    /// Runner error (spawn failure, timeout, unknown action)
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,

    pub duration_ms: u64,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
