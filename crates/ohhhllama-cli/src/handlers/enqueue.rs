//! `ohhhllama enqueue`: administrative enqueue, not rate limited.

use ohhhllama_core::{JobId, QueueError};

use crate::bootstrap::CliContext;
use crate::commands::EnqueueTarget;
use crate::error::CliError;

use super::CLI_ORIGIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued(JobId),
    AlreadyQueued(JobId),
}

pub async fn execute(ctx: &CliContext, target: &EnqueueTarget) -> Result<EnqueueOutcome, CliError> {
    let subject = target.subject()?;
    let outcome = match ctx.stores.jobs.enqueue(&subject, CLI_ORIGIN).await {
        Ok(id) => {
            println!("Queued {subject} as job {id}");
            EnqueueOutcome::Queued(id)
        }
        Err(QueueError::DuplicateJob { existing, .. }) => {
            println!("{subject} is already queued as job {existing}");
            EnqueueOutcome::AlreadyQueued(existing)
        }
        Err(e) => return Err(e.into()),
    };
    Ok(outcome)
}
