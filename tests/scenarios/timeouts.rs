//! Test: Timeouts - a step that exceeds its deadline fails

use crate::helpers::*;
use std::time::Duration;
use workflow::execution::RunConfig;
use workflow::{InstanceId, JobStatus};

/// The run-wide step deadline fails a slow step and halts the job
#[tokio::test]
async fn test_default_step_timeout() {
    let yaml = r#"
name: "timeouts"
jobs:
  - name: build
    steps:
      - run: hang
      - run: never
"#;
    let runner = MockRunner::new().on("hang", MockStep::sleep(5_000));
    let config = RunConfig::new("timeouts").with_step_timeout(Duration::from_millis(50));
    let report = run_with_mock(yaml, runner.clone(), config).await;

    let id = InstanceId::single("build");
    assert_status(&report, &id, JobStatus::Failed);
    let steps = report.steps(&id).unwrap();
    assert_eq!(steps.len(), 1);
    assert!(steps[0].error.as_deref().unwrap_or_default().contains("timed out"));
    assert!(!runner.was_called("never"));
}

/// A per-step timeout overrides the run default
#[tokio::test]
async fn test_step_timeout_overrides_default() {
    let yaml = r#"
name: "timeouts"
jobs:
  - name: build
    steps:
      - run: slow-but-allowed
        timeout_secs: 5
"#;
    let runner = MockRunner::new().on("slow-but-allowed", MockStep::sleep(100));
    let config = RunConfig::new("timeouts").with_step_timeout(Duration::from_millis(20));
    let report = run_with_mock(yaml, runner, config).await;

    assert_status(&report, &InstanceId::single("build"), JobStatus::Succeeded);
}

/// A timed-out best-effort step lets the job continue
#[tokio::test]
async fn test_best_effort_timeout_continues() {
    let yaml = r#"
name: "timeouts"
jobs:
  - name: build
    steps:
      - run: hang
        continue_on_error: true
      - run: next
"#;
    let runner = MockRunner::new().on("hang", MockStep::sleep(5_000));
    let config = RunConfig::new("timeouts").with_step_timeout(Duration::from_millis(50));
    let report = run_with_mock(yaml, runner.clone(), config).await;

    assert_status(&report, &InstanceId::single("build"), JobStatus::Succeeded);
    assert!(runner.was_called("next"));
}
