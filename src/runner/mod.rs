//! Step runners: execute resolved step invocations

pub mod config;
pub mod output;
pub mod shell;

use crate::core::step::Invocation;
use async_trait::async_trait;
use std::collections::HashMap;

pub use config::ShellRunnerConfig;
pub use output::{CommandOutput, RunnerError};
pub use shell::ShellRunner;

/// Trait for step execution - allows for different implementations
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run one step invocation with its effective environment
    ///
    /// A command that runs to completion with a non-zero exit code is an
    /// `Ok` output; errors are reserved for invocations that could not run.
    async fn execute(
        &self,
        invocation: &Invocation,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, RunnerError>;
}
