//! Step executor - runs the steps of one job instance with the runner

use crate::{
    core::{
        config::WorkflowConfig,
        context::ExecutionContext,
        error::ConfigError,
        graph::PrerequisitePolicy,
        job::JobInstance,
        report::ReportHandle,
        state::{JobStatus, StepResult, StepStatus},
        step::Step,
    },
    execution::engine::{EventEmitter, ExecutionEvent},
    runner::{RunnerError, StepRunner},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity used when neither the workflow nor the caller sets one
pub const DEFAULT_CAPACITY: usize = 4;

/// Immutable settings shared by every instance of a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Workflow name, used in the report
    pub workflow: String,

    /// Process-wide environment defaults
    pub defaults: Arc<HashMap<String, String>>,

    /// Number of concurrent instance slots
    pub capacity: usize,

    /// Cancel the run after the first failed instance
    pub fail_fast: bool,

    /// Deadline for steps without their own timeout
    pub step_timeout: Option<Duration>,

    pub policy: PrerequisitePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workflow: "workflow".to_string(),
            defaults: Arc::new(HashMap::new()),
            capacity: DEFAULT_CAPACITY,
            fail_fast: false,
            step_timeout: None,
            policy: PrerequisitePolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            ..Default::default()
        }
    }

    /// Run settings declared in a workflow document
    pub fn from_workflow(config: &WorkflowConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            workflow: config.name.clone(),
            defaults: Arc::new(config.default_env()?),
            capacity: config.capacity.unwrap_or(DEFAULT_CAPACITY),
            fail_fast: config.fail_fast,
            step_timeout: config.step_timeout_secs.map(Duration::from_secs),
            policy: config.prerequisite_policy(),
        })
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_policy(mut self, policy: PrerequisitePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add or override process-wide defaults
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = (*self.defaults).clone();
        merged.extend(defaults.into_iter().map(|(k, v)| (k.into(), v.into())));
        self.defaults = Arc::new(merged);
        self
    }
}

/// Shared handles an executor needs while an instance runs
#[derive(Clone)]
pub struct RunContext {
    pub config: Arc<RunConfig>,
    pub report: ReportHandle,
    pub cancel: CancellationToken,
    pub events: EventEmitter,
}

impl RunContext {
    pub fn new(config: Arc<RunConfig>, report: ReportHandle) -> Self {
        Self {
            config,
            report,
            cancel: CancellationToken::new(),
            events: EventEmitter::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }
}

/// Executes the steps of a job instance
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: StepRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every step of the instance in order and record its terminal status
    ///
    /// `index` is the instance's position in the report. The cancellation
    /// token is checked before each step; a step that already started runs
    /// to completion.
    pub async fn run(&self, index: usize, instance: &JobInstance, ctx: &RunContext) -> JobStatus {
        info!("Executing job instance: {}", instance.id);
        let env = ExecutionContext::new(ctx.config.defaults.clone(), instance);

        let mut status = JobStatus::Succeeded;
        let mut failed_step = None;

        for (step_index, step) in instance.steps.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                info!("Job instance {} cancelled before step {}", instance.id, step_index);
                status = JobStatus::Cancelled;
                break;
            }

            ctx.events.emit(ExecutionEvent::StepStarted {
                id: instance.id.clone(),
                index: step_index,
                name: step.display_name(),
            });

            let result = self.run_step(step_index, step, &env, &ctx.config).await;
            let halts = !result.succeeded() && !step.continue_on_error;
            if !result.succeeded() {
                warn!(
                    "Step {} of {} failed{}",
                    result.name,
                    instance.id,
                    if halts { "" } else { " (continuing)" }
                );
            }

            ctx.report.push_step(index, result.clone()).await;
            ctx.events.emit(ExecutionEvent::StepFinished {
                id: instance.id.clone(),
                result,
            });

            if halts {
                status = JobStatus::Failed;
                failed_step = Some(step_index);
                break;
            }
        }

        ctx.report.finish_instance(index, status, failed_step).await;
        info!("Job instance {} finished: {:?}", instance.id, status);
        ctx.events.emit(ExecutionEvent::InstanceFinished {
            id: instance.id.clone(),
            status,
        });

        status
    }

    async fn run_step(
        &self,
        index: usize,
        step: &Step,
        ctx: &ExecutionContext,
        config: &RunConfig,
    ) -> StepResult {
        let env = ctx.environment_for(step);
        let invocation = step.resolve(&env);
        debug!("Resolved step {}: {:?}", index, invocation);

        let deadline = step
            .timeout_secs
            .map(Duration::from_secs)
            .or(config.step_timeout);

        let started_at = Utc::now();
        let start = Instant::now();
        let outcome = match deadline {
            Some(limit) => timeout(limit, self.runner.execute(&invocation, &env))
                .await
                .unwrap_or_else(|_| Err(RunnerError::Timeout(limit))),
            None => self.runner.execute(&invocation, &env).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (status, exit_code, output, error) = match outcome {
            Ok(out) => {
                let status = if out.success() {
                    StepStatus::Succeeded
                } else {
                    StepStatus::Failed
                };
                (status, out.exit_code, out.output, None)
            }
            Err(e) => (StepStatus::Failed, None, String::new(), Some(e.to_string())),
        };

        StepResult {
            index,
            name: step.display_name(),
            status,
            best_effort: step.continue_on_error,
            exit_code,
            output,
            error,
            started_at,
            duration_ms,
        }
    }
}
