//! workflow - A matrix-aware CI workflow runner

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;

// Re-export commonly used types
pub use core::config::WorkflowConfig;
pub use core::{
    Axis, Combination, ConfigError, GraphError, InstanceId, JobDefinition, JobGraph, JobInstance,
    JobStatus, MatrixExpander, MatrixSpec, RunReport, RunStatus, Step, StepKind, WorkflowError,
};
pub use execution::{ExecutionEngine, ExecutionEvent, RunConfig};
pub use runner::{CommandOutput, RunnerError, ShellRunner, ShellRunnerConfig, StepRunner};
