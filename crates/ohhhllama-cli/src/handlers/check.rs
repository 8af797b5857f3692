//! `ohhhllama check`: resolver dry run.

use ohhhllama_acquire::Resolver;
use ohhhllama_core::{Plan, Quantization};

use crate::error::CliError;
use crate::presentation::print_plan;

/// Resolve `repo_id` and print the plan. Nothing is downloaded or queued.
pub async fn execute(resolver: &Resolver, repo_id: &str, quant: Quantization) -> Result<Plan, CliError> {
    let repo_id = repo_id.trim();
    if !repo_id.contains('/') {
        return Err(CliError::Arguments(format!(
            "repository '{repo_id}' must look like 'owner/name'"
        )));
    }

    let plan = resolver.resolve(repo_id, quant).await?;
    print_plan(repo_id, &plan);
    Ok(plan)
}
