//! Test: Step Execution - ordering, best-effort steps and environment layering

use crate::helpers::*;
use workflow::core::state::StepStatus;
use workflow::execution::RunConfig;
use workflow::{InstanceId, JobStatus, RunStatus};

const THREE_STEPS: &str = r#"
name: "steps"
jobs:
  - name: build
    steps:
      - run: step-a
      - run: step-b
      - run: step-c
"#;

/// A failing step halts the job
#[tokio::test]
async fn test_stops_at_first_failed_step() {
    let runner = MockRunner::new().on("step-b", MockStep::fail().with_output("boom"));
    let report = run_with_mock(THREE_STEPS, runner.clone(), RunConfig::new("steps")).await;

    let id = InstanceId::single("build");
    assert_status(&report, &id, JobStatus::Failed);
    assert_eq!(report.summarize(), RunStatus::Failed);
    assert_eq!(runner.commands(), vec!["step-a", "step-b"]);

    let entry = report.entry(&id).unwrap();
    assert_eq!(entry.steps.len(), 2);
    assert_eq!(entry.failed_step, Some(1));
    assert_eq!(entry.steps[1].exit_code, Some(1));
    assert_eq!(entry.steps[1].output, "boom");
}

/// A best-effort failure is recorded but the job continues and succeeds
#[tokio::test]
async fn test_best_effort_step_does_not_fail_job() {
    let yaml = r#"
name: "steps"
jobs:
  - name: build
    steps:
      - run: step-a
      - run: step-b
        continue_on_error: true
      - run: step-c
"#;
    let runner = MockRunner::new().on("step-b", MockStep::fail());
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("steps")).await;

    let id = InstanceId::single("build");
    assert_status(&report, &id, JobStatus::Succeeded);
    assert_eq!(report.summarize(), RunStatus::Succeeded);

    let steps = report.steps(&id).unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[1].status, StepStatus::Failed);
    assert!(steps[1].best_effort);
    assert_eq!(report.entry(&id).unwrap().failed_step, None);
}

/// Step env overrides instance variables, which override process defaults
#[tokio::test]
async fn test_environment_layering() {
    let yaml = r#"
name: "env"
env:
  LEVEL: workflow
  ONLY_DEFAULT: yes
jobs:
  - name: build
    env:
      LEVEL: job
      ONLY_JOB: "1"
    matrix:
      axes:
        os: [linux]
    steps:
      - run: first {{ LEVEL }} {{ os }}
      - run: second {{ LEVEL }}
        env:
          LEVEL: step
"#;
    let runner = MockRunner::new();
    let config = RunConfig::new("env").with_defaults([("FROM_CLI", "cli")]);
    run_with_mock(yaml, runner.clone(), config).await;

    assert_eq!(runner.commands(), vec!["first job linux", "second step"]);

    let first = runner.call("first job linux").unwrap();
    assert_eq!(first.env.get("ONLY_JOB").map(String::as_str), Some("1"));
    assert_eq!(first.env.get("os").map(String::as_str), Some("linux"));
    assert_eq!(first.env.get("FROM_CLI").map(String::as_str), Some("cli"));

    let second = runner.call("second step").unwrap();
    assert_eq!(second.env.get("LEVEL").map(String::as_str), Some("step"));
}

/// Action steps reach the runner with rendered parameters
#[tokio::test]
async fn test_action_step_reaches_runner() {
    let yaml = r#"
name: "actions"
jobs:
  - name: build
    steps:
      - uses: checkout
        with:
          ref: main
"#;
    let runner = MockRunner::new();
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("actions")).await;

    assert_eq!(runner.commands(), vec!["uses:checkout"]);
    let steps = report.steps(&InstanceId::single("build")).unwrap();
    assert_eq!(steps[0].name, "uses: checkout");
}
