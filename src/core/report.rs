//! Run report - per-instance step results and terminal statuses
//!
//! The report is the only state shared between concurrently running job
//! instances. While a run is in progress it lives behind a [`ReportHandle`];
//! each instance's entry is written only by that instance's executor, and the
//! scheduler reads consistent snapshots under the read lock. Once the run ends
//! the handle is consumed and the finalized [`RunReport`] is read-only.

use crate::core::{
    job::InstanceId,
    state::{JobStatus, RunStatus, StepResult},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

/// Report entry for one job instance
#[derive(Debug, Clone, Serialize)]
pub struct InstanceReport {
    pub id: InstanceId,
    pub status: JobStatus,
    pub steps: Vec<StepResult>,
    /// Index of the step that failed the instance
    pub failed_step: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl InstanceReport {
    fn new(id: InstanceId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            steps: Vec::new(),
            failed_step: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Per-status tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub blocked: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

/// Compact, serializable outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub workflow: String,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Results of a workflow run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    run_id: Uuid,
    workflow: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    entries: Vec<InstanceReport>,
    #[serde(skip)]
    index: HashMap<InstanceId, usize>,
}

impl RunReport {
    /// Create an empty report with one pending entry per instance, in order
    pub fn new(workflow: impl Into<String>, instances: impl IntoIterator<Item = InstanceId>) -> Self {
        let entries: Vec<InstanceReport> = instances.into_iter().map(InstanceReport::new).collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            workflow: workflow.into(),
            started_at: Utc::now(),
            finished_at: None,
            entries,
            index,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Every instance entry, in enumeration order
    pub fn entries(&self) -> &[InstanceReport] {
        &self.entries
    }

    pub fn entry(&self, id: &InstanceId) -> Option<&InstanceReport> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn entry_at(&self, index: usize) -> Option<&InstanceReport> {
        self.entries.get(index)
    }

    pub fn status(&self, id: &InstanceId) -> Option<JobStatus> {
        self.entry(id).map(|e| e.status)
    }

    pub fn status_at(&self, index: usize) -> JobStatus {
        self.entries
            .get(index)
            .map(|e| e.status)
            .unwrap_or(JobStatus::Pending)
    }

    pub fn steps(&self, id: &InstanceId) -> Option<&[StepResult]> {
        self.entry(id).map(|e| e.steps.as_slice())
    }

    /// Indices of instances that have not been dispatched or settled
    pub fn pending(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == JobStatus::Pending)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check if every instance reached a terminal status
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.status.is_terminal())
    }

    /// Failed if any instance failed, was blocked or was cancelled
    pub fn summarize(&self) -> RunStatus {
        if self.entries.iter().any(|e| e.status.is_failure()) {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        }
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            match entry.status {
                JobStatus::Succeeded => counts.succeeded += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Blocked => counts.blocked += 1,
                JobStatus::Skipped => counts.skipped += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
                JobStatus::Pending | JobStatus::Running => {}
            }
        }
        counts
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            workflow: self.workflow.clone(),
            status: self.summarize(),
            counts: self.counts(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn mark_running(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.status = JobStatus::Running;
            entry.started_at = Some(Utc::now());
        }
    }

    pub(crate) fn push_step(&mut self, index: usize, result: StepResult) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.steps.push(result);
        }
    }

    pub(crate) fn finish_instance(&mut self, index: usize, status: JobStatus, failed_step: Option<usize>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.status = status;
            entry.failed_step = failed_step;
            entry.finished_at = Some(Utc::now());
        }
    }

    fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Live, shared view of a report while the run is in progress
#[derive(Debug, Clone)]
pub struct ReportHandle {
    inner: Arc<RwLock<RunReport>>,
}

impl ReportHandle {
    pub fn new(report: RunReport) -> Self {
        Self {
            inner: Arc::new(RwLock::new(report)),
        }
    }

    /// Consistent read-only snapshot
    pub async fn read(&self) -> RwLockReadGuard<'_, RunReport> {
        self.inner.read().await
    }

    pub(crate) async fn mark_running(&self, index: usize) {
        self.inner.write().await.mark_running(index);
    }

    pub(crate) async fn push_step(&self, index: usize, result: StepResult) {
        self.inner.write().await.push_step(index, result);
    }

    pub(crate) async fn finish_instance(&self, index: usize, status: JobStatus, failed_step: Option<usize>) {
        self.inner
            .write()
            .await
            .finish_instance(index, status, failed_step);
    }

    /// Close the run and hand back the read-only report
    pub async fn finalize(self) -> RunReport {
        let mut report = match Arc::try_unwrap(self.inner) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().await.clone(),
        };
        report.finalize();
        report
    }
}
