//! Test: Dependencies - ordering, blocking and skipped jobs

use crate::helpers::*;
use workflow::core::graph::PrerequisitePolicy;
use workflow::execution::RunConfig;
use workflow::{InstanceId, JobStatus, RunStatus};

/// A dependent job starts only after its prerequisite finished
#[tokio::test]
async fn test_dependent_runs_after_prerequisite() {
    let yaml = r#"
name: "deps"
jobs:
  - name: deploy
    needs: [build]
    steps:
      - run: deploy
  - name: build
    steps:
      - run: build
"#;
    let runner = MockRunner::new().on("build", MockStep::sleep(50));
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("deps").with_capacity(4)).await;

    assert_eq!(report.summarize(), RunStatus::Succeeded);
    let build = runner.call("build").unwrap();
    let deploy = runner.call("deploy").unwrap();
    assert!(deploy.started >= build.finished);
}

/// A failed prerequisite blocks the dependent, whose steps never run
#[tokio::test]
async fn test_failed_prerequisite_blocks_dependent() {
    let yaml = r#"
name: "deps"
jobs:
  - name: a
    steps:
      - run: step-a
  - name: b
    needs: [a]
    steps:
      - run: step-b
"#;
    let runner = MockRunner::new().on("step-a", MockStep::fail());
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("deps")).await;

    assert_status(&report, &InstanceId::single("a"), JobStatus::Failed);
    assert_status(&report, &InstanceId::single("b"), JobStatus::Blocked);
    assert!(!runner.was_called("step-b"));
    assert!(report.steps(&InstanceId::single("b")).unwrap().is_empty());
    assert_eq!(report.counts().blocked, 1);
}

/// One failed matrix instance blocks the dependent job; siblings still run
#[tokio::test]
async fn test_matrix_prerequisite_failure() {
    let yaml = r#"
name: "deps"
jobs:
  - name: test
    matrix:
      axes:
        os: [linux, macos, windows]
    steps:
      - run: test {{ os }}
  - name: release
    needs: [test]
    steps:
      - run: release
"#;
    let runner = MockRunner::new().on("test macos", MockStep::fail());
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("deps").with_capacity(1)).await;

    assert_status(&report, &instance("test", &[("os", "linux")]), JobStatus::Succeeded);
    assert_status(&report, &instance("test", &[("os", "macos")]), JobStatus::Failed);
    assert_status(&report, &instance("test", &[("os", "windows")]), JobStatus::Succeeded);
    assert_status(&report, &InstanceId::single("release"), JobStatus::Blocked);
    assert_eq!(runner.commands(), vec!["test linux", "test macos", "test windows"]);
}

/// Skipped jobs never run; dependents are blocked unless the policy allows it
#[tokio::test]
async fn test_skipped_prerequisite() {
    let yaml = r#"
name: "skip"
jobs:
  - name: docs
    skip: true
    steps:
      - run: docs
  - name: publish
    needs: [docs]
    steps:
      - run: publish
"#;
    let report = run_with_mock(yaml, MockRunner::new(), RunConfig::new("skip")).await;
    assert_status(&report, &InstanceId::single("docs"), JobStatus::Skipped);
    assert_status(&report, &InstanceId::single("publish"), JobStatus::Blocked);

    let runner = MockRunner::new();
    let config = RunConfig::new("skip").with_policy(PrerequisitePolicy::SucceededOrSkipped);
    let report = run_with_mock(yaml, runner.clone(), config).await;
    assert_status(&report, &InstanceId::single("publish"), JobStatus::Succeeded);
    assert_eq!(runner.commands(), vec!["publish"]);
    assert_eq!(report.summarize(), RunStatus::Succeeded);
}
