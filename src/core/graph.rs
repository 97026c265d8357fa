//! Job graph - expanded job instances plus dependency edges between jobs

use crate::core::{
    error::{ConfigError, GraphError, WorkflowError},
    job::{InstanceId, JobDefinition, JobInstance},
    report::RunReport,
    state::JobStatus,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Which prerequisite outcomes allow a dependent job to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrerequisitePolicy {
    /// Every prerequisite instance must have succeeded
    #[default]
    Succeeded,
    /// Skipped prerequisite instances count as satisfied
    SucceededOrSkipped,
}

impl PrerequisitePolicy {
    fn satisfied_by(self, status: JobStatus) -> bool {
        match self {
            PrerequisitePolicy::Succeeded => status == JobStatus::Succeeded,
            PrerequisitePolicy::SucceededOrSkipped => {
                matches!(status, JobStatus::Succeeded | JobStatus::Skipped)
            }
        }
    }
}

/// A named job and its instances
#[derive(Debug, Clone)]
pub struct JobNode {
    pub name: String,
    pub needs: Vec<String>,
    /// Indices into the graph's instance list
    pub instances: Vec<usize>,
}

/// Immutable graph of job instances, built once per run
#[derive(Debug, Clone)]
pub struct JobGraph {
    jobs: Vec<JobNode>,
    job_indices: HashMap<String, usize>,
    instances: Vec<Arc<JobInstance>>,
    instance_jobs: Vec<usize>,
}

impl JobGraph {
    /// Expand every job and validate the dependency relation
    pub fn build(definitions: &[JobDefinition]) -> Result<Self, WorkflowError> {
        let mut jobs = Vec::with_capacity(definitions.len());
        let mut job_indices = HashMap::new();
        let mut instances = Vec::new();
        let mut instance_jobs = Vec::new();

        for (job_index, definition) in definitions.iter().enumerate() {
            if job_indices
                .insert(definition.name.clone(), job_index)
                .is_some()
            {
                return Err(ConfigError::DuplicateJob {
                    job: definition.name.clone(),
                }
                .into());
            }

            let mut indices = Vec::new();
            for instance in definition.expand()? {
                indices.push(instances.len());
                instances.push(Arc::new(instance));
                instance_jobs.push(job_index);
            }

            jobs.push(JobNode {
                name: definition.name.clone(),
                needs: definition.needs.clone(),
                instances: indices,
            });
        }

        for job in &jobs {
            for dep in &job.needs {
                if !job_indices.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        job: job.name.clone(),
                        dependency: dep.clone(),
                    }
                    .into());
                }
            }
        }

        let graph = Self {
            jobs,
            job_indices,
            instances,
            instance_jobs,
        };
        graph.check_cycles()?;

        Ok(graph)
    }

    /// Number of job instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn jobs(&self) -> &[JobNode] {
        &self.jobs
    }

    pub fn job(&self, name: &str) -> Option<&JobNode> {
        self.job_indices.get(name).map(|&i| &self.jobs[i])
    }

    /// Instances in enumeration order
    pub fn instances(&self) -> &[Arc<JobInstance>] {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> Option<&Arc<JobInstance>> {
        self.instances.get(index)
    }

    pub fn instance_ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().map(|i| i.id.clone())
    }

    /// Undispatched instances whose prerequisite jobs are all satisfied
    pub fn eligible(&self, report: &RunReport, policy: PrerequisitePolicy) -> Vec<usize> {
        (0..self.instances.len())
            .filter(|&i| {
                report.status_at(i) == JobStatus::Pending
                    && !self.instances[i].skip
                    && self.prerequisites_met(i, report, policy)
            })
            .collect()
    }

    /// Undispatched instances that can never become eligible
    pub fn blocked(&self, report: &RunReport, policy: PrerequisitePolicy) -> Vec<usize> {
        (0..self.instances.len())
            .filter(|&i| {
                report.status_at(i) == JobStatus::Pending
                    && !self.instances[i].skip
                    && self.prerequisite_instances(i).any(|p| {
                        let status = report.status_at(p);
                        status.is_terminal() && !policy.satisfied_by(status)
                    })
            })
            .collect()
    }

    /// Undispatched instances of disabled jobs
    pub fn skipped(&self, report: &RunReport) -> Vec<usize> {
        (0..self.instances.len())
            .filter(|&i| report.status_at(i) == JobStatus::Pending && self.instances[i].skip)
            .collect()
    }

    fn prerequisites_met(&self, index: usize, report: &RunReport, policy: PrerequisitePolicy) -> bool {
        self.prerequisite_instances(index)
            .all(|p| policy.satisfied_by(report.status_at(p)))
    }

    fn prerequisite_instances(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let job = &self.jobs[self.instance_jobs[index]];
        job.needs
            .iter()
            .filter_map(|dep| self.job_indices.get(dep))
            .flat_map(|&j| self.jobs[j].instances.iter().copied())
    }

    /// Job names in dependency order, declaration order breaking ties
    pub fn topological_order(&self) -> Vec<&str> {
        let mut remaining: Vec<usize> = self.jobs.iter().map(|j| j.needs.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.jobs.len()];
        for (i, job) in self.jobs.iter().enumerate() {
            for dep in &job.needs {
                if let Some(&d) = self.job_indices.get(dep) {
                    dependents[d].push(i);
                }
            }
        }

        let mut ready: VecDeque<usize> = (0..self.jobs.len()).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(self.jobs.len());
        while let Some(i) = ready.pop_front() {
            order.push(self.jobs[i].name.as_str());
            for &d in &dependents[i] {
                remaining[d] -= 1;
                if remaining[d] == 0 {
                    ready.push_back(d);
                }
            }
        }
        order
    }

    fn check_cycles(&self) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for i in 0..self.jobs.len() {
            if !visited.contains(&i) {
                self.dfs_check(i, &mut visited, &mut path)?;
            }
        }

        Ok(())
    }

    fn dfs_check(
        &self,
        job: usize,
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Result<(), GraphError> {
        visited.insert(job);
        path.push(job);

        for dep in &self.jobs[job].needs {
            let Some(&d) = self.job_indices.get(dep) else {
                continue;
            };
            if let Some(start) = path.iter().position(|&p| p == d) {
                let mut jobs: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| self.jobs[p].name.clone())
                    .collect();
                jobs.push(self.jobs[d].name.clone());
                return Err(GraphError::CyclicDependency { jobs });
            }
            if !visited.contains(&d) {
                self.dfs_check(d, visited, path)?;
            }
        }

        path.pop();
        Ok(())
    }
}
