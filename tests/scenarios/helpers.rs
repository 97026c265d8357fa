//! Test utility functions for workflow scenarios

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use workflow::core::step::Invocation;
use workflow::execution::{ExecutionEngine, RunConfig};
use workflow::runner::{CommandOutput, RunnerError, StepRunner};
use workflow::{Combination, InstanceId, JobGraph, JobStatus, RunReport, WorkflowConfig};

/// Scripted behaviour for one command
#[derive(Debug, Clone, Default)]
pub struct MockStep {
    pub exit_code: i32,
    pub delay: Option<Duration>,
    pub output: String,
}

impl MockStep {
    pub fn fail() -> Self {
        Self {
            exit_code: 1,
            ..Default::default()
        }
    }

    pub fn sleep(ms: u64) -> Self {
        Self {
            delay: Some(Duration::from_millis(ms)),
            ..Default::default()
        }
    }

    /// Finish only after `ms` milliseconds
    pub fn after_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }
}

/// One recorded runner invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub command: String,
    pub env: HashMap<String, String>,
    pub started: Instant,
    pub finished: Instant,
}

/// Mock runner: commands succeed immediately unless scripted otherwise
#[derive(Clone, Default)]
pub struct MockRunner {
    script: Arc<HashMap<String, MockStep>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behaviour of a (rendered) command
    pub fn on(mut self, command: &str, step: MockStep) -> Self {
        Arc::make_mut(&mut self.script).insert(command.to_string(), step);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands in the order they started
    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.commands().iter().any(|c| c == command)
    }

    pub fn call(&self, command: &str) -> Option<Call> {
        self.calls().into_iter().find(|c| c.command == command)
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn execute(
        &self,
        invocation: &Invocation,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, RunnerError> {
        let command = match invocation {
            Invocation::Command(command) => command.clone(),
            Invocation::Action { name, .. } => format!("uses:{}", name),
        };
        let step = self.script.get(&command).cloned().unwrap_or_default();

        let started = Instant::now();
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                command: command.clone(),
                env: env.clone(),
                started,
                finished: started,
            });
            calls.len() - 1
        };

        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap()[index].finished = Instant::now();
        Ok(CommandOutput::new(step.exit_code, step.output))
    }
}

/// Parse a workflow and build its job graph
pub fn graph_from_yaml(yaml: &str) -> JobGraph {
    WorkflowConfig::from_yaml(yaml)
        .expect("workflow should parse")
        .to_graph()
        .expect("graph should build")
}

/// Run a workflow with a mock runner
pub async fn run_with_mock(yaml: &str, runner: MockRunner, config: RunConfig) -> RunReport {
    let graph = graph_from_yaml(yaml);
    let engine = ExecutionEngine::new(runner, config);
    tokio::time::timeout(Duration::from_secs(10), engine.execute(&graph))
        .await
        .expect("run should finish")
}

/// Identity of a matrix instance from key/value pairs
pub fn instance(job: &str, key: &[(&str, &str)]) -> InstanceId {
    InstanceId::new(job, key.iter().copied().collect::<Combination>())
}

pub fn assert_status(report: &RunReport, id: &InstanceId, expected: JobStatus) {
    assert_eq!(
        report.status(id),
        Some(expected),
        "unexpected status for {}",
        id
    );
}

/// Whether two recorded calls ran at the same time
pub fn overlaps(a: &Call, b: &Call) -> bool {
    a.started < b.finished && b.started < a.finished
}
