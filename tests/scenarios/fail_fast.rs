//! Test: Fail-fast - cancellation after the first failed instance

use crate::helpers::*;
use workflow::execution::RunConfig;
use workflow::{InstanceId, JobStatus, RunStatus};

const WORKFLOW: &str = r#"
name: "fail-fast"
jobs:
  - name: a
    steps:
      - run: step-a
  - name: b
    steps:
      - run: slow
      - run: after-slow
  - name: c
    steps:
      - run: step-c
  - name: d
    needs: [a]
    steps:
      - run: step-d
"#;

fn runner() -> MockRunner {
    MockRunner::new()
        .on("step-a", MockStep::fail().after_ms(20))
        .on("slow", MockStep::sleep(200))
}

/// In-flight instances stop at the next step boundary; nothing new starts
#[tokio::test]
async fn test_fail_fast_cancels_remaining_work() {
    let runner = runner();
    let config = RunConfig::new("fail-fast").with_capacity(2).with_fail_fast(true);
    let report = run_with_mock(WORKFLOW, runner.clone(), config).await;

    assert_status(&report, &InstanceId::single("a"), JobStatus::Failed);
    assert_status(&report, &InstanceId::single("b"), JobStatus::Cancelled);
    assert_status(&report, &InstanceId::single("c"), JobStatus::Cancelled);
    assert_status(&report, &InstanceId::single("d"), JobStatus::Blocked);

    // The step already running finished; the next one never started
    assert!(runner.was_called("slow"));
    assert!(!runner.was_called("after-slow"));
    assert!(!runner.was_called("step-c"));
    assert_eq!(report.steps(&InstanceId::single("b")).unwrap().len(), 1);

    assert_eq!(report.summarize(), RunStatus::Failed);
    let counts = report.counts();
    assert_eq!((counts.failed, counts.cancelled, counts.blocked), (1, 2, 1));
}

/// Without fail-fast, independent work still completes
#[tokio::test]
async fn test_without_fail_fast_independent_jobs_finish() {
    let runner = runner();
    let config = RunConfig::new("fail-fast").with_capacity(2);
    let report = run_with_mock(WORKFLOW, runner.clone(), config).await;

    assert_status(&report, &InstanceId::single("a"), JobStatus::Failed);
    assert_status(&report, &InstanceId::single("b"), JobStatus::Succeeded);
    assert_status(&report, &InstanceId::single("c"), JobStatus::Succeeded);
    assert_status(&report, &InstanceId::single("d"), JobStatus::Blocked);
    assert!(runner.was_called("after-slow"));
    assert_eq!(report.counts().cancelled, 0);
}

/// Best-effort failures never trigger fail-fast
#[tokio::test]
async fn test_best_effort_failure_does_not_cancel() {
    let yaml = r#"
name: "fail-fast"
jobs:
  - name: lint
    steps:
      - run: lint
        continue_on_error: true
  - name: test
    steps:
      - run: test
"#;
    let runner = MockRunner::new().on("lint", MockStep::fail());
    let config = RunConfig::new("fail-fast").with_capacity(1).with_fail_fast(true);
    let report = run_with_mock(yaml, runner.clone(), config).await;

    assert_eq!(report.summarize(), RunStatus::Succeeded);
    assert!(runner.was_called("test"));
}
