use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use workflow::cli::commands::{MatrixCommand, RunCommand, ValidateCommand};
use workflow::cli::output::*;
use workflow::cli::{error_exit_code, exit_code, report_exit_code, Cli, Command};
use workflow::execution::{ExecutionEngine, ExecutionEvent, RunConfig};
use workflow::runner::{ShellRunner, ShellRunnerConfig};
use workflow::WorkflowConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    let result = match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await,
        Command::Validate(cmd) => validate_workflow(cmd),
        Command::Matrix(cmd) => show_matrix(cmd),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("{} {}", CROSS, style(format!("{:#}", err)).red());
            error_exit_code(&err)
        }
    };

    std::process::exit(code);
}

fn load_config(path: &std::path::Path) -> Result<WorkflowConfig> {
    WorkflowConfig::from_file(path)
        .with_context(|| format!("Failed to load workflow config {}", path.display()))
}

async fn run_workflow(cmd: &RunCommand) -> Result<i32> {
    let config = load_config(&cmd.config)?;
    let graph = config.to_graph().context("Invalid workflow")?;

    // Command-line flags override the workflow document
    let mut run_config = RunConfig::from_workflow(&config)?
        .with_fail_fast(cmd.fail_fast_override().unwrap_or(config.fail_fast))
        .with_defaults(cmd.env.iter().cloned());
    if let Some(capacity) = cmd.capacity {
        run_config = run_config.with_capacity(capacity.get());
    }
    if let Some(secs) = cmd.step_timeout {
        run_config = run_config.with_step_timeout(Duration::from_secs(secs));
    }
    debug!("Run configuration: {:?}", run_config);

    let runner = ShellRunner::new(ShellRunnerConfig::new().with_actions(config.actions.clone()));
    let mut engine = ExecutionEngine::new(runner, run_config);

    // Set up event handler for console output
    let progress = if cmd.json {
        None
    } else {
        println!("{} Loaded workflow: {}", INFO, style(&config.name).bold());
        Some(Arc::new(create_progress_bar(graph.len())))
    };
    if let Some(progress) = progress.clone() {
        engine.add_event_handler(move |event: ExecutionEvent| {
            let line = format_execution_event(&event);
            if progress.is_hidden() {
                println!("{}", line);
            } else {
                progress.println(line);
            }
            if is_instance_terminal(&event) {
                progress.inc(1);
            }
        });
    }

    let report = engine.execute(&graph).await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if let Some(path) = &cmd.report {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    if cmd.json {
        println!("{}", report.to_json()?);
    } else {
        println!("\n{}", format_report(&report));
        if let Some(path) = &cmd.report {
            println!("{} Report written to {}", INFO, style(path.display()).dim());
        }
    }

    Ok(report_exit_code(&report.counts()))
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<i32> {
    println!("{} Validating workflow...", INFO);

    let config = load_config(&cmd.config)?;
    let graph = config.to_graph().context("Invalid workflow")?;

    println!("{} Workflow configuration is valid!", CHECK);
    println!("  Name: {}", style(&config.name).bold());
    println!("  Jobs: {}", style(graph.jobs().len()).cyan());
    println!("  Instances: {}", style(graph.len()).cyan());
    println!("  Order: {}", style(graph.topological_order().join(" -> ")).dim());

    if cmd.json {
        let json = serde_json::to_string_pretty(&config)?;
        println!("\n{}", json);
    }

    Ok(exit_code::SUCCESS)
}

fn show_matrix(cmd: &MatrixCommand) -> Result<i32> {
    let config = load_config(&cmd.config)?;
    let graph = config.to_graph().context("Invalid workflow")?;

    if let Some(job) = &cmd.job {
        if graph.job(job).is_none() {
            anyhow::bail!("Unknown job: {}", job);
        }
    }

    if cmd.json {
        let instances: Vec<_> = graph
            .instances()
            .iter()
            .filter(|i| cmd.job.as_ref().map_or(true, |j| &i.id.job == j))
            .map(|i| i.as_ref())
            .collect();
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        println!("{}", format_matrix(&graph, cmd.job.as_deref()));
    }

    Ok(exit_code::SUCCESS)
}
