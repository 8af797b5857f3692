//! Plain streaming HTTP transfer, the last resort.
//!
//! Each file is written chunk by chunk to `<file>.part` and renamed into
//! place once complete, so an interrupted transfer never leaves a truncated
//! file under the final name. Not resumable: a retry starts over.
//!
//! There is no overall deadline since model files run to tens of
//! gigabytes. Instead every wait on the peer, for response headers or for
//! the next chunk, is bounded by a stall timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use ohhhllama_core::{DownloadStrategy, FetchRequest, StrategyError};
use tokio::io::AsyncWriteExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence tolerated from the peer before the transfer is abandoned.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpStreamStrategy {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    stall_timeout: Duration,
}

impl HttpStreamStrategy {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("ohhhllama/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token,
            stall_timeout: STALL_TIMEOUT,
        })
    }

    #[must_use]
    pub const fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    async fn fetch_one(&self, repo_id: &str, file: &str, output: &Path) -> Result<u64, StrategyError> {
        let url = ohhhllama_hf::download_url(&self.base_url, repo_id, file)
            .map_err(|e| StrategyError::Failed(e.to_string()))?;

        let mut request = self.client.get(url.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = tokio::time::timeout(self.stall_timeout, request.send())
            .await
            .map_err(|_| StrategyError::Failed(format!("no response from {url}")))?
            .map_err(|e| StrategyError::Failed(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(StrategyError::Failed(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StrategyError::Failed(e.to_string()))?;
        }

        let partial = part_path(output);
        let written = match write_stream(response, &partial, self.stall_timeout).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, output)
            .await
            .map_err(|e| StrategyError::Failed(format!("rename {}: {e}", partial.display())))?;
        Ok(written)
    }
}

/// `model.gguf` -> `model.gguf.part`.
fn part_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_stream(
    response: reqwest::Response,
    partial: &Path,
    stall_timeout: Duration,
) -> Result<u64, StrategyError> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| StrategyError::Failed(format!("create {}: {e}", partial.display())))?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    loop {
        let Some(chunk) = tokio::time::timeout(stall_timeout, stream.next())
            .await
            .map_err(|_| {
                StrategyError::Failed(format!(
                    "transfer stalled: no data for {stall_timeout:?} after {written} bytes"
                ))
            })?
        else {
            break;
        };
        let chunk = chunk.map_err(|e| StrategyError::Failed(format!("transfer interrupted: {e}")))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| StrategyError::Failed(e.to_string()))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| StrategyError::Failed(e.to_string()))?;
    Ok(written)
}

#[async_trait]
impl DownloadStrategy for HttpStreamStrategy {
    fn name(&self) -> &'static str {
        "http-stream"
    }

    fn resumable(&self) -> bool {
        false
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<(), StrategyError> {
        for file in &request.files {
            let output = request.dest_dir.join(file);
            let bytes = self.fetch_one(&request.repo_id, file, &output).await?;
            tracing::debug!(target: "ohhhllama.fetch", file = %file, bytes, "streamed file");
        }
        Ok(())
    }
}
