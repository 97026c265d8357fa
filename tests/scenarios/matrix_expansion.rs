//! Test: Matrix Expansion - axes, includes and excludes through the workflow loader

use crate::helpers::*;
use std::collections::HashSet;
use workflow::execution::RunConfig;
use workflow::{ConfigError, WorkflowConfig};

/// Every combination of the axes runs exactly once
#[tokio::test]
async fn test_cartesian_product_runs_every_combination() {
    let yaml = r#"
name: "matrix"
jobs:
  - name: test
    matrix:
      axes:
        os: [linux, macos]
        rust: [stable, beta, nightly]
    steps:
      - run: test {{ os }} {{ rust }}
"#;
    let runner = MockRunner::new();
    let report = run_with_mock(yaml, runner.clone(), RunConfig::new("matrix").with_capacity(1)).await;

    assert_eq!(report.counts().succeeded, 6);
    let commands: HashSet<_> = runner.commands().into_iter().collect();
    assert_eq!(commands.len(), 6);
    // Last axis varies fastest
    assert_eq!(runner.commands()[..2], ["test linux stable", "test linux beta"]);
}

/// A matching include augments, a non-matching include appends
#[test]
fn test_include_augments_or_appends() {
    let yaml = r#"
name: "matrix"
jobs:
  - name: test
    matrix:
      axes:
        os: [linux, macos]
      include:
        - os: linux
          coverage: "true"
        - os: windows
          experimental: "true"
    steps:
      - run: test
"#;
    let graph = graph_from_yaml(yaml);
    assert_eq!(graph.len(), 3);

    let instances = graph.instances();
    assert_eq!(instances[0].variables.get("coverage").map(String::as_str), Some("true"));
    assert_eq!(instances[1].variables.get("coverage"), None);
    assert_eq!(instances[2].id.to_string(), "test (os=windows, experimental=true)");
}

/// Excluded combinations are removed before includes apply
#[test]
fn test_exclude_removes_combination() {
    let yaml = r#"
name: "matrix"
jobs:
  - name: test
    matrix:
      axes:
        os: [linux, macos]
        rust: [stable, nightly]
      exclude:
        - os: macos
          rust: nightly
    steps:
      - run: test
"#;
    let graph = graph_from_yaml(yaml);
    let ids: Vec<String> = graph.instances().iter().map(|i| i.id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "test (os=linux, rust=stable)",
            "test (os=linux, rust=nightly)",
            "test (os=macos, rust=stable)",
        ]
    );
}

/// An include that recreates an existing combination is rejected
#[test]
fn test_duplicate_include_is_config_error() {
    let yaml = r#"
name: "matrix"
jobs:
  - name: test
    matrix:
      include:
        - os: linux
        - os: linux
    steps:
      - run: test
"#;
    let result = WorkflowConfig::from_yaml(yaml);
    assert!(matches!(result, Err(ConfigError::DuplicateCombination { .. })));
}

/// Duplicate axis values are rejected when the graph is built
#[test]
fn test_duplicate_axis_value_is_config_error() {
    let yaml = r#"
name: "matrix"
jobs:
  - name: test
    matrix:
      axes:
        os: [linux, linux]
    steps:
      - run: test
"#;
    let err = WorkflowConfig::from_yaml(yaml).err().unwrap();
    assert!(matches!(err, ConfigError::DuplicateAxisValue { .. }));
}
