//! CLI output formatting

use crate::{
    core::{
        graph::JobGraph,
        report::{InstanceReport, RunReport},
        state::{JobStatus, RunStatus},
    },
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(bar_style.progress_chars("#>-"));
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a job status for display
pub fn format_job_status(status: JobStatus) -> String {
    match status {
        JobStatus::Pending => style("PENDING").dim().to_string(),
        JobStatus::Running => style("RUNNING").yellow().to_string(),
        JobStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        JobStatus::Failed => style("FAILED").red().to_string(),
        JobStatus::Blocked => style("BLOCKED").yellow().to_string(),
        JobStatus::Skipped => style("SKIPPED").dim().to_string(),
        JobStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

fn status_icon(status: JobStatus) -> Emoji<'static, 'static> {
    match status {
        JobStatus::Succeeded => CHECK,
        JobStatus::Failed => CROSS,
        JobStatus::Pending | JobStatus::Running => SPINNER,
        JobStatus::Skipped => SKIP,
        JobStatus::Blocked | JobStatus::Cancelled => WARN,
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            workflow,
            instances,
        } => format!(
            "{} Starting workflow {} ({}) with {} job instances",
            ROCKET,
            style(workflow).bold(),
            style(&run_id.to_string()[..8]).dim(),
            style(instances).cyan()
        ),
        ExecutionEvent::InstanceStarted { id } => {
            format!("{} {}", SPINNER, style(id).cyan())
        }
        ExecutionEvent::StepStarted { id, index, name } => format!(
            "  {} step {}: {}",
            style(id).dim(),
            index + 1,
            name
        ),
        ExecutionEvent::StepFinished { id, result } => {
            let outcome = if result.succeeded() {
                style("ok").green().to_string()
            } else if result.best_effort {
                style("failed (continuing)").yellow().to_string()
            } else {
                style("failed").red().to_string()
            };
            let detail = match (&result.error, result.exit_code) {
                (Some(error), _) => format!(" - {}", error),
                (None, Some(code)) if code != 0 => format!(" - exit code {}", code),
                _ => String::new(),
            };
            format!(
                "  {} {} {} ({}ms){}",
                style(id).dim(),
                result.name,
                outcome,
                result.duration_ms,
                detail
            )
        }
        ExecutionEvent::InstanceFinished { id, status } => format!(
            "{} {} {}",
            status_icon(*status),
            style(id).bold(),
            format_job_status(*status)
        ),
        ExecutionEvent::InstanceBlocked { id } => format!(
            "{} {} {} (prerequisite did not succeed)",
            WARN,
            style(id).bold(),
            format_job_status(JobStatus::Blocked)
        ),
        ExecutionEvent::InstanceSkipped { id } => format!(
            "{} {} {}",
            SKIP,
            style(id).bold(),
            format_job_status(JobStatus::Skipped)
        ),
        ExecutionEvent::InstanceCancelled { id } => format!(
            "{} {} {}",
            WARN,
            style(id).bold(),
            format_job_status(JobStatus::Cancelled)
        ),
        ExecutionEvent::RunFinished { run_id, status } => {
            let status_str = match status {
                RunStatus::Succeeded => format!("{} completed", style("successfully").green()),
                RunStatus::Failed => style("failed").red().to_string(),
            };
            format!(
                "{} Workflow ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Whether an event closes out an instance (advances the progress bar)
pub fn is_instance_terminal(event: &ExecutionEvent) -> bool {
    matches!(
        event,
        ExecutionEvent::InstanceFinished { .. }
            | ExecutionEvent::InstanceBlocked { .. }
            | ExecutionEvent::InstanceSkipped { .. }
            | ExecutionEvent::InstanceCancelled { .. }
    )
}

/// Format one report entry, with the failing step's output when there is one
pub fn format_instance_report(entry: &InstanceReport, max_output_lines: usize) -> String {
    let mut line = format!(
        "{} {} {} ({} steps)",
        status_icon(entry.status),
        style(&entry.id).bold(),
        format_job_status(entry.status),
        entry.steps.len()
    );

    if let Some(step) = entry.failed_step.and_then(|i| entry.steps.get(i)) {
        line.push_str(&format!("\n    failed at step {}: {}", step.index + 1, style(&step.name).red()));
        if let Some(error) = &step.error {
            line.push_str(&format!("\n    {}", style(error).dim()));
        }
        let output = step.output.trim_end();
        if !output.is_empty() {
            for out in format_output(output, max_output_lines).lines() {
                line.push_str(&format!("\n    | {}", out));
            }
        }
    }

    line
}

/// Format the final run report for display
pub fn format_report(report: &RunReport) -> String {
    let summary = report.summary();
    let counts = summary.counts;

    let mut lines: Vec<String> = report
        .entries()
        .iter()
        .map(|entry| format_instance_report(entry, 10))
        .collect();

    let (icon, status) = match summary.status {
        RunStatus::Succeeded => (CHECK, style("succeeded").green().to_string()),
        RunStatus::Failed => (CROSS, style("failed").red().to_string()),
    };
    lines.push(String::new());
    lines.push(format!(
        "{} {} {}: {} total, {} succeeded, {} failed, {} blocked, {} skipped, {} cancelled",
        icon,
        style(&summary.workflow).bold(),
        status,
        counts.total,
        style(counts.succeeded).green(),
        style(counts.failed).red(),
        style(counts.blocked).yellow(),
        style(counts.skipped).dim(),
        style(counts.cancelled).yellow()
    ));

    lines.join("\n")
}

/// Format the expanded instances of a graph, grouped by job
pub fn format_matrix(graph: &JobGraph, job: Option<&str>) -> String {
    let mut lines = Vec::new();
    for node in graph.jobs().iter().filter(|n| job.map_or(true, |j| n.name == j)) {
        let needs = if node.needs.is_empty() {
            String::new()
        } else {
            format!(" (needs: {})", node.needs.join(", "))
        };
        lines.push(format!(
            "{} {}{} - {} instance(s)",
            INFO,
            style(&node.name).bold(),
            style(needs).dim(),
            style(node.instances.len()).cyan()
        ));

        for instance in node.instances.iter().filter_map(|&i| graph.instance(i)) {
            let mut variables: Vec<_> = instance.variables.iter().collect();
            variables.sort();
            let rendered: Vec<String> = variables.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            lines.push(format!(
                "  {} {}",
                style(&instance.id).cyan(),
                style(rendered.join(" ")).dim()
            ));
        }
    }
    lines.join("\n")
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
