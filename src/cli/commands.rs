//! CLI command definitions

use clap::Args;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Run a workflow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Number of job instances that may run concurrently (at least 1)
    #[arg(long)]
    pub capacity: Option<NonZeroUsize>,

    /// Cancel remaining work after the first failed job instance
    #[arg(long, overrides_with = "no_fail_fast")]
    pub fail_fast: bool,

    /// Keep running after failures, even if the workflow enables fail-fast
    #[arg(long, overrides_with = "fail_fast")]
    pub no_fail_fast: bool,

    /// Default step deadline in seconds
    #[arg(long, value_name = "SECS")]
    pub step_timeout: Option<u64>,

    /// Environment defaults (KEY=VALUE), overriding the workflow's `env`
    #[arg(short, long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Write the JSON run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print the run report as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    /// Fail-fast setting forced from the command line, if any
    pub fn fail_fast_override(&self) -> Option<bool> {
        if self.no_fail_fast {
            Some(false)
        } else if self.fail_fast {
            Some(true)
        } else {
            None
        }
    }
}

/// Validate a workflow configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Print expanded matrix instances
#[derive(Debug, Args, Clone)]
pub struct MatrixCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Only show instances of this job
    #[arg(short, long)]
    pub job: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
