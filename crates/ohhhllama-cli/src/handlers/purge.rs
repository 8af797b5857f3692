//! `ohhhllama purge`: retention for finished jobs.

use std::time::Duration;

use crate::bootstrap::CliContext;
use crate::error::CliError;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub async fn execute(ctx: &CliContext, older_than_days: Option<u64>) -> Result<u64, CliError> {
    let age = older_than_days.map_or(ctx.config.purge_after, |days| {
        DAY.saturating_mul(u32::try_from(days).unwrap_or(u32::MAX))
    });
    let removed = ctx.stores.jobs.purge_terminal_older_than(age).await?;
    println!("Purged {removed} finished job(s)");
    Ok(removed)
}
