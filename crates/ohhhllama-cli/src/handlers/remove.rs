//! `ohhhllama remove`: drop a pending job.

use ohhhllama_core::JobId;

use crate::bootstrap::CliContext;
use crate::commands::EnqueueTarget;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, target: &EnqueueTarget) -> Result<JobId, CliError> {
    let subject = target.subject()?;
    let id = ctx.stores.jobs.remove_pending(&subject).await?;
    println!("Removed job {id} ({subject})");
    Ok(id)
}
