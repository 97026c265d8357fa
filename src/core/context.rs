//! Execution context - layered environment for a job instance

use crate::core::{job::JobInstance, step::Step};
use std::collections::HashMap;
use std::sync::Arc;

/// Environment seen by the steps of one job instance
///
/// Layers, lowest precedence first: process-wide defaults, job-instance
/// variables, step-level overrides.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Process-wide defaults, shared by every instance of the run
    defaults: Arc<HashMap<String, String>>,

    /// Resolved matrix and job variables
    instance_variables: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new(defaults: Arc<HashMap<String, String>>, instance: &JobInstance) -> Self {
        Self {
            defaults,
            instance_variables: instance.variables.clone(),
        }
    }

    /// Get a variable as the job sees it (ignoring step overrides)
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.instance_variables
            .get(key)
            .or_else(|| self.defaults.get(key))
    }

    /// Effective environment for a step
    pub fn environment_for(&self, step: &Step) -> HashMap<String, String> {
        let mut env = (*self.defaults).clone();
        env.extend(self.instance_variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}
