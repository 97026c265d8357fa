//! Error types for workflow configuration and graph construction

use thiserror::Error;

/// Malformed matrix, job or document definitions
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("axis '{axis}' has no values")]
    EmptyAxis { axis: String },

    #[error("axis '{axis}' is declared more than once")]
    DuplicateAxis { axis: String },

    #[error("axis '{axis}' lists value '{value}' more than once")]
    DuplicateAxisValue { axis: String, value: String },

    #[error("exclude entry references '{key}', which is not an axis")]
    UnknownExcludeKey { key: String },

    #[error("matrix has no combinations left after {excluded} exclude entries")]
    EmptyMatrix { excluded: usize },

    #[error("include entry duplicates existing combination ({combination})")]
    DuplicateCombination { combination: String },

    #[error("job '{job}' is declared more than once")]
    DuplicateJob { job: String },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("step {index} of job '{job}' must set exactly one of `run` or `uses`")]
    EmptyStep { job: String, index: usize },

    #[error("failed to read workflow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse workflow document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Unsatisfiable dependency declarations between jobs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("cyclic dependency between jobs: {}", .jobs.join(" -> "))]
    CyclicDependency { jobs: Vec<String> },

    #[error("job '{job}' needs unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },
}

/// Fatal errors that abort a run before any job executes
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
