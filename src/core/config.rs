//! Workflow configuration from YAML

use crate::core::{
    error::{ConfigError, WorkflowError},
    graph::{JobGraph, PrerequisitePolicy},
    job::JobDefinition,
    matrix::{Axis, Combination, MatrixSpec},
    step::{Step, StepKind},
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Top-level workflow document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Process-wide environment defaults
    #[serde(default)]
    env: HashMap<String, Value>,

    /// Default for fail-fast cancellation
    #[serde(default, alias = "fail-fast")]
    pub fail_fast: bool,

    /// Default number of concurrent job instances
    #[serde(default, alias = "max-parallel")]
    pub capacity: Option<usize>,

    /// Default deadline for every step (in seconds)
    #[serde(default)]
    pub step_timeout_secs: Option<u64>,

    /// Whether skipped prerequisites satisfy dependent jobs
    #[serde(default)]
    pub allow_skipped_prerequisites: bool,

    /// Action name -> command template
    #[serde(default)]
    pub actions: HashMap<String, String>,

    /// Jobs, in declaration order
    pub jobs: Vec<JobConfig>,
}

/// Job configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,

    /// Jobs that must succeed before this one runs
    #[serde(default)]
    pub needs: Vec<String>,

    /// Disable the job without removing it
    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    env: HashMap<String, Value>,

    #[serde(default)]
    pub matrix: Option<MatrixConfig>,

    pub steps: Vec<StepConfig>,
}

/// Matrix configuration: axes, include and exclude entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Axis name -> list of values, in declaration order
    #[serde(default)]
    pub axes: Mapping,

    #[serde(default)]
    pub include: Vec<Mapping>,

    #[serde(default)]
    pub exclude: Vec<Mapping>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Inline command
    #[serde(default)]
    pub run: Option<String>,

    /// Action reference
    #[serde(default)]
    pub uses: Option<String>,

    /// Action parameters
    #[serde(default)]
    with: BTreeMap<String, Value>,

    #[serde(default)]
    env: HashMap<String, Value>,

    #[serde(default, alias = "continue-on-error")]
    pub continue_on_error: bool,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse workflow configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate document-level structure
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(&job.name) {
                return Err(ConfigError::DuplicateJob { job: job.name.clone() });
            }
            for (index, step) in job.steps.iter().enumerate() {
                if step.run.is_some() == step.uses.is_some() {
                    return Err(ConfigError::EmptyStep {
                        job: job.name.clone(),
                        index,
                    });
                }
            }
        }

        if self.capacity == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.default_env()?;
        for definition in self.to_job_definitions()? {
            definition.expand()?;
        }
        Ok(())
    }

    /// Process-wide environment defaults as strings
    pub fn default_env(&self) -> Result<HashMap<String, String>, ConfigError> {
        string_map(&self.env)
    }

    pub fn prerequisite_policy(&self) -> PrerequisitePolicy {
        if self.allow_skipped_prerequisites {
            PrerequisitePolicy::SucceededOrSkipped
        } else {
            PrerequisitePolicy::Succeeded
        }
    }

    /// Convert jobs to the core model
    pub fn to_job_definitions(&self) -> Result<Vec<JobDefinition>, ConfigError> {
        self.jobs.iter().map(JobConfig::to_definition).collect()
    }

    /// Build the job graph (expands matrices, checks dependencies)
    pub fn to_graph(&self) -> Result<JobGraph, WorkflowError> {
        JobGraph::build(&self.to_job_definitions()?)
    }
}

impl JobConfig {
    fn to_definition(&self) -> Result<JobDefinition, ConfigError> {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| step.to_step(&self.name, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobDefinition {
            name: self.name.clone(),
            needs: self.needs.clone(),
            matrix: match &self.matrix {
                Some(matrix) => matrix.to_spec()?,
                None => MatrixSpec::new(),
            },
            env: string_map(&self.env)?,
            steps,
            skip: self.skip,
        })
    }
}

impl MatrixConfig {
    /// Convert to a matrix spec, normalizing scalar values to strings
    pub fn to_spec(&self) -> Result<MatrixSpec, ConfigError> {
        let mut axes = Vec::with_capacity(self.axes.len());
        for (name, values) in &self.axes {
            let name = mapping_key(name)?;
            let values = match values {
                Value::Sequence(seq) => seq
                    .iter()
                    .map(|v| scalar_to_string(&name, v))
                    .collect::<Result<Vec<_>, _>>()?,
                other => vec![scalar_to_string(&name, other)?],
            };
            axes.push(Axis { name, values });
        }

        Ok(MatrixSpec {
            axes,
            include: self.include.iter().map(combination).collect::<Result<_, _>>()?,
            exclude: self.exclude.iter().map(combination).collect::<Result<_, _>>()?,
        })
    }
}

impl StepConfig {
    fn to_step(&self, job: &str, index: usize) -> Result<Step, ConfigError> {
        let kind = match (&self.run, &self.uses) {
            (Some(run), None) => StepKind::Command { run: run.clone() },
            (None, Some(uses)) => StepKind::Action {
                uses: uses.clone(),
                with: self
                    .with
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), scalar_to_string(k, v)?)))
                    .collect::<Result<_, ConfigError>>()?,
            },
            _ => {
                return Err(ConfigError::EmptyStep {
                    job: job.to_string(),
                    index,
                })
            }
        };

        Ok(Step {
            name: self.name.clone(),
            kind,
            env: string_map(&self.env)?,
            continue_on_error: self.continue_on_error,
            timeout_secs: self.timeout_secs,
        })
    }
}

fn mapping_key(key: &Value) -> Result<String, ConfigError> {
    scalar_to_string("matrix key", key)
}

fn combination(mapping: &Mapping) -> Result<Combination, ConfigError> {
    let mut combination = Combination::new();
    for (k, v) in mapping {
        let key = mapping_key(k)?;
        let value = scalar_to_string(&key, v)?;
        combination.insert(key, value);
    }
    Ok(combination)
}

fn string_map(values: &HashMap<String, Value>) -> Result<HashMap<String, String>, ConfigError> {
    values
        .iter()
        .map(|(k, v)| Ok((k.clone(), scalar_to_string(k, v)?)))
        .collect()
}

/// Normalize a YAML scalar to its string form
fn scalar_to_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "expected a string, number or boolean".to_string(),
        }),
    }
}
