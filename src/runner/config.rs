//! Shell runner configuration

use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration for the shell runner
#[derive(Debug, Clone)]
pub struct ShellRunnerConfig {
    /// Shell used to interpret commands, invoked as `<shell> -c <command>`
    pub shell: String,

    /// Working directory for spawned commands (inherits when unset)
    pub working_dir: Option<PathBuf>,

    /// Action name -> command template
    pub actions: HashMap<String, String>,
}

impl Default for ShellRunnerConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            working_dir: None,
            actions: HashMap::new(),
        }
    }
}

impl ShellRunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_action(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.actions.insert(name.into(), template.into());
        self
    }

    pub fn with_actions(mut self, actions: HashMap<String, String>) -> Self {
        self.actions.extend(actions);
        self
    }
}
