//! Shell runner - runs commands through `sh -c` as subprocesses

use crate::core::step::{render, Invocation};
use crate::runner::{CommandOutput, RunnerError, ShellRunnerConfig, StepRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runner that executes steps as shell subprocesses
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: ShellRunnerConfig,
}

impl ShellRunner {
    pub fn new(config: ShellRunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShellRunnerConfig {
        &self.config
    }

    /// Turn an invocation into a command line plus extra environment
    ///
    /// Action parameters are exported as `INPUT_<NAME>` and are available to
    /// the action template as `{{ inputs.<name> }}`.
    fn prepare(
        &self,
        invocation: &Invocation,
        env: &HashMap<String, String>,
    ) -> Result<(String, HashMap<String, String>), RunnerError> {
        match invocation {
            Invocation::Command(command) => Ok((command.clone(), HashMap::new())),
            Invocation::Action { name, params } => {
                let template = self
                    .config
                    .actions
                    .get(name)
                    .ok_or_else(|| RunnerError::UnknownAction(name.clone()))?;

                let mut variables = env.clone();
                let mut inputs = HashMap::new();
                for (key, value) in params {
                    variables.insert(format!("inputs.{}", key), value.clone());
                    inputs.insert(input_variable(key), value.clone());
                }

                Ok((render(template, &variables), inputs))
            }
        }
    }
}

fn input_variable(param: &str) -> String {
    let name: String = param
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("INPUT_{}", name)
}

#[async_trait]
impl StepRunner for ShellRunner {
    async fn execute(
        &self,
        invocation: &Invocation,
        env: &HashMap<String, String>,
    ) -> Result<CommandOutput, RunnerError> {
        let (command, inputs) = self.prepare(invocation, env)?;
        debug!("Spawning {} -c with command length: {}", self.config.shell, command.len());

        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(&command)
            .envs(env)
            .envs(&inputs)
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| RunnerError::Spawn(format!("{}: {}", self.config.shell, e)))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        let exit_code = output.status.code();
        if !output.status.success() {
            warn!("Command exited with code {:?}: {}", exit_code, stderr.trim());
        }
        debug!("Command returned {} bytes of output", text.len());

        Ok(CommandOutput {
            exit_code,
            output: text,
        })
    }
}
