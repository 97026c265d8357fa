//! Job definitions and their expanded instances

use crate::core::{
    error::ConfigError,
    matrix::{Combination, MatrixExpander, MatrixInstance, MatrixSpec},
    step::Step,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A job as declared, before matrix expansion
#[derive(Debug, Clone, Default)]
pub struct JobDefinition {
    pub name: String,

    /// Names of jobs that must succeed first
    pub needs: Vec<String>,

    pub matrix: MatrixSpec,

    /// Job-level variables, overridden by matrix values
    pub env: HashMap<String, String>,

    pub steps: Vec<Step>,

    /// Disabled job: instances terminate as skipped without running
    pub skip: bool,
}

impl JobDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.needs.push(job.into());
        self
    }

    pub fn matrix(mut self, matrix: MatrixSpec) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Expand the matrix into concrete instances, in enumeration order
    pub fn expand(&self) -> Result<Vec<JobInstance>, ConfigError> {
        Ok(MatrixExpander::expand(&self.matrix)?
            .into_iter()
            .map(|combination| JobInstance::new(self, combination))
            .collect())
    }
}

/// Identity of a job instance: job name plus matrix key
///
/// Keys compare as mappings, so lookups do not depend on key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceId {
    pub job: String,
    pub key: Combination,
}

impl InstanceId {
    pub fn new(job: impl Into<String>, key: Combination) -> Self {
        Self { job: job.into(), key }
    }

    /// Identity of a job without a matrix
    pub fn single(job: impl Into<String>) -> Self {
        Self::new(job, Combination::new())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.job)
        } else {
            write!(f, "{} ({})", self.job, self.key)
        }
    }
}

/// One concrete run of a job for one matrix combination
#[derive(Debug, Clone, Serialize)]
pub struct JobInstance {
    pub id: InstanceId,

    /// Job env layered under the matrix variables
    pub variables: HashMap<String, String>,

    pub steps: Vec<Step>,

    pub skip: bool,
}

impl JobInstance {
    fn new(job: &JobDefinition, combination: MatrixInstance) -> Self {
        let mut variables = job.env.clone();
        for (k, v) in combination.variables.iter() {
            variables.insert(k.to_string(), v.to_string());
        }

        Self {
            id: InstanceId::new(job.name.clone(), combination.key),
            variables,
            steps: job.steps.clone(),
            skip: job.skip,
        }
    }
}
