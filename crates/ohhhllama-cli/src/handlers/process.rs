//! `ohhhllama process`: one scheduled activation of the queue processor.
//!
//! Ctrl-C stops the processor from claiming further jobs. The job in flight
//! finishes first, so the queue never holds a half-written status.

use ohhhllama_acquire::{QueueProcessor, RunSummary};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::presentation::print_summary;

pub async fn execute(processor: &QueueProcessor, cancel: CancellationToken) -> Result<RunSummary, CliError> {
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        tracing::warn!(target: "ohhhllama.processor", "Interrupted; finishing the current job");
                        cancel.cancel();
                    }
                }
                () = cancel.cancelled() => {}
            }
        }
    });

    let result = processor.run_once().await;
    cancel.cancel();
    let _ = watcher.await;

    let summary = result?;
    print_summary(&summary);
    Ok(summary)
}
