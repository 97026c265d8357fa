//! Step domain model

use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Inline shell command
    Command { run: String },
    /// Named action with parameters, resolved by the runner
    Action {
        uses: String,
        with: BTreeMap<String, String>,
    },
}

/// A single step of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Optional human-readable name
    pub name: Option<String>,

    /// Command or action reference
    pub kind: StepKind,

    /// Step-level environment overrides
    pub env: HashMap<String, String>,

    /// Best-effort: a failure is recorded but does not halt the job
    pub continue_on_error: bool,

    /// Deadline for this step, overriding the run default
    pub timeout_secs: Option<u64>,
}

/// A step with placeholders resolved, ready for the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Command(String),
    Action {
        name: String,
        params: BTreeMap<String, String>,
    },
}

impl Step {
    pub fn command(run: impl Into<String>) -> Self {
        Self::from_kind(StepKind::Command { run: run.into() })
    }

    pub fn action<I, K, V>(uses: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_kind(StepKind::Action {
            uses: uses.into(),
            with: params.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        })
    }

    fn from_kind(kind: StepKind) -> Self {
        Self {
            name: None,
            kind,
            env: HashMap::new(),
            continue_on_error: false,
            timeout_secs: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Name used in reports: the explicit name, or one derived from the step body
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.kind {
            StepKind::Command { run } => {
                let first = run.lines().next().unwrap_or_default().trim();
                format!("run: {}", first)
            }
            StepKind::Action { uses, .. } => format!("uses: {}", uses),
        }
    }

    /// Resolve `{{ key }}` placeholders against the effective environment
    pub fn resolve(&self, env: &HashMap<String, String>) -> Invocation {
        match &self.kind {
            StepKind::Command { run } => Invocation::Command(render(run, env)),
            StepKind::Action { uses, with } => Invocation::Action {
                name: render(uses, env),
                params: with
                    .iter()
                    .map(|(k, v)| (k.clone(), render(v, env)))
                    .collect(),
            },
        }
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Substitute `{{ key }}` placeholders; unknown keys are left as written
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
