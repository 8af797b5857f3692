//! `ohhhllama reset-rate`.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, origin: &str) -> Result<u64, CliError> {
    let reset = ctx.stores.rate_limiter.reset(origin).await?;
    if reset == 0 {
        println!("No requests recorded today for {origin}");
    } else {
        println!("Reset today's request count for {origin}");
    }
    Ok(reset)
}
