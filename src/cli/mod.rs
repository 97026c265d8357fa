//! Command-line interface

pub mod commands;
pub mod output;

use crate::core::{
    error::{ConfigError, GraphError, WorkflowError},
    report::RunCounts,
};
use clap::{Parser, Subcommand};
use commands::{MatrixCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Process exit codes
pub mod exit_code {
    /// Every instance succeeded or was skipped
    pub const SUCCESS: i32 = 0;
    /// At least one instance failed
    pub const FAILED: i32 = 1;
    /// No failures, but some instances were blocked or cancelled
    pub const INCOMPLETE: i32 = 2;
    /// Invalid or unreadable workflow configuration
    pub const CONFIG_ERROR: i32 = 3;
    /// Unsatisfiable job dependencies
    pub const GRAPH_ERROR: i32 = 4;
}

/// Matrix-aware CI workflow runner
#[derive(Debug, Parser, Clone)]
#[command(name = "workflow")]
#[command(author = "Workflow Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Run CI-style workflows with build matrices and job dependencies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a workflow
    Run(RunCommand),

    /// Validate a workflow configuration
    Validate(ValidateCommand),

    /// Show the expanded job instances of a workflow
    Matrix(MatrixCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

/// Exit code for a finished run
pub fn report_exit_code(counts: &RunCounts) -> i32 {
    if counts.failed > 0 {
        exit_code::FAILED
    } else if counts.blocked > 0 || counts.cancelled > 0 {
        exit_code::INCOMPLETE
    } else {
        exit_code::SUCCESS
    }
}

/// Exit code for an error that aborted the command
pub fn error_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(workflow_err) = cause.downcast_ref::<WorkflowError>() {
            return match workflow_err {
                WorkflowError::Config(_) => exit_code::CONFIG_ERROR,
                WorkflowError::Graph(_) => exit_code::GRAPH_ERROR,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return exit_code::CONFIG_ERROR;
        }
        if cause.downcast_ref::<GraphError>().is_some() {
            return exit_code::GRAPH_ERROR;
        }
    }
    exit_code::FAILED
}
