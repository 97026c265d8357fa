//! Test: Parallelism - capacity bounds concurrent job instances

use crate::helpers::*;
use workflow::execution::RunConfig;
use workflow::RunStatus;

const TWO_INDEPENDENT: &str = r#"
name: "parallel"
jobs:
  - name: left
    steps:
      - run: left
  - name: right
    steps:
      - run: right
"#;

fn runner() -> MockRunner {
    MockRunner::new()
        .on("left", MockStep::sleep(100))
        .on("right", MockStep::sleep(100))
}

/// With one slot, independent instances never overlap
#[tokio::test]
async fn test_capacity_one_serializes() {
    let runner = runner();
    let report = run_with_mock(TWO_INDEPENDENT, runner.clone(), RunConfig::new("parallel").with_capacity(1)).await;

    assert_eq!(report.summarize(), RunStatus::Succeeded);
    let left = runner.call("left").unwrap();
    let right = runner.call("right").unwrap();
    assert!(!overlaps(&left, &right));
    // Enumeration order breaks ties
    assert_eq!(runner.commands(), vec!["left", "right"]);
}

/// With two slots, independent instances run at the same time
#[tokio::test]
async fn test_capacity_two_overlaps() {
    let runner = runner();
    run_with_mock(TWO_INDEPENDENT, runner.clone(), RunConfig::new("parallel").with_capacity(2)).await;

    let left = runner.call("left").unwrap();
    let right = runner.call("right").unwrap();
    assert!(overlaps(&left, &right));
}

/// Zero capacity is treated as one slot
#[tokio::test]
async fn test_zero_capacity_still_runs() {
    let runner = runner();
    let report = run_with_mock(TWO_INDEPENDENT, runner.clone(), RunConfig::new("parallel").with_capacity(0)).await;

    assert_eq!(report.counts().succeeded, 2);
    assert!(!overlaps(&runner.call("left").unwrap(), &runner.call("right").unwrap()));
}

/// No more than `capacity` matrix instances run at once
#[tokio::test]
async fn test_matrix_respects_capacity() {
    let yaml = r#"
name: "parallel"
jobs:
  - name: test
    matrix:
      axes:
        shard: [1, 2, 3, 4, 5]
    steps:
      - run: shard {{ shard }}
"#;
    let mut runner = MockRunner::new();
    for shard in 1..=5 {
        runner = runner.on(&format!("shard {}", shard), MockStep::sleep(60));
    }
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("parallel").with_capacity(2)).await;
    assert_eq!(report.counts().succeeded, 5);

    let calls = runner.calls();
    for call in &calls {
        let concurrent = calls.iter().filter(|other| overlaps(call, other)).count();
        // Includes the call itself
        assert!(concurrent <= 2, "{} overlapped with {} calls", call.command, concurrent - 1);
    }
}
