//! Job, plan and run-summary rendering.

use ohhhllama_acquire::RunSummary;
use ohhhllama_core::{Job, Plan, StatusCounts};

use super::tables::{format_optional, print_separator, truncate_string};

const TABLE_WIDTH: usize = 110;

/// One table row for a job.
pub fn job_row(job: &Job) -> String {
    format!(
        "{:<6} {:<21} {:<12} {:<36} {:<16} {}",
        job.id,
        job.kind(),
        job.status,
        truncate_string(&job.subject.to_string(), 35),
        truncate_string(&job.origin, 15),
        job.updated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn print_counts(counts: &StatusCounts) {
    println!(
        "pending: {}  in-progress: {}  completed: {}  failed: {}",
        counts.pending, counts.in_progress, counts.completed, counts.failed
    );
}

pub fn print_job_table(title: &str, jobs: &[Job]) {
    println!("\n{title} ({})", jobs.len());
    if jobs.is_empty() {
        return;
    }
    println!(
        "{:<6} {:<21} {:<12} {:<36} {:<16} Updated",
        "ID", "Kind", "Status", "Subject", "Origin"
    );
    print_separator(TABLE_WIDTH);
    for job in jobs {
        println!("{}", job_row(job));
        if let Some(error) = &job.error {
            println!("       error: {error}");
        }
    }
}

/// Human-readable resolver decision.
pub fn describe_plan(plan: &Plan) -> String {
    match plan {
        Plan::DirectArtifact {
            source,
            quant,
            alternate,
        } => {
            let origin = if *alternate { "redistributor" } else { "requested repository" };
            format!(
                "direct artifact from {origin}: {}/{} (quantization {})",
                source.repo_id,
                source.file,
                format_optional(quant.as_ref(), "unknown"),
            )
        }
        Plan::ConvertibleSource {
            repo_id,
            architecture,
            files,
        } => format!(
            "convert from raw repository {repo_id} ({architecture}, {} files)",
            files.len()
        ),
        Plan::Unsupported { reason } => format!("unsupported: {reason}"),
    }
}

pub fn print_plan(repo_id: &str, plan: &Plan) {
    println!("{repo_id}: {}", describe_plan(plan));
    if let Plan::ConvertibleSource { files, .. } = plan {
        for file in files {
            println!("  {file}");
        }
    }
}

pub fn print_summary(summary: &RunSummary) {
    println!(
        "recovered: {}  completed: {}  failed: {}  attempts: {}",
        summary.recovered, summary.completed, summary.failed, summary.attempts
    );
}
