//! Resumable per-file transfer through `wget -c`.

use std::path::Path;

use async_trait::async_trait;
use ohhhllama_core::{DownloadStrategy, FetchRequest, StrategyError};
use tokio::process::Command;

use super::{FILE_TIMEOUT, tool_outcome};
use crate::process::{locate, run_tool};

pub struct WgetStrategy {
    program: String,
    base_url: String,
    token: Option<String>,
}

impl WgetStrategy {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self::with_program("wget", base_url, token)
    }

    pub fn with_program(program: impl Into<String>, base_url: &str, token: Option<String>) -> Self {
        Self {
            program: program.into(),
            base_url: base_url.to_string(),
            token,
        }
    }

    fn command(&self, program: &Path, url: &str, output: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("-c").arg("-q").arg("-O").arg(output);
        if let Some(token) = &self.token {
            cmd.arg(format!("--header=Authorization: Bearer {token}"));
        }
        cmd.arg(url);
        cmd
    }
}

#[async_trait]
impl DownloadStrategy for WgetStrategy {
    fn name(&self) -> &'static str {
        "wget"
    }

    fn resumable(&self) -> bool {
        true
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<(), StrategyError> {
        let program = locate(&self.program).map_err(tool_outcome)?;
        for file in &request.files {
            let url = ohhhllama_hf::download_url(&self.base_url, &request.repo_id, file)
                .map_err(|e| StrategyError::Failed(e.to_string()))?;
            let output = request.dest_dir.join(file);
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StrategyError::Failed(e.to_string()))?;
            }
            tracing::debug!(target: "ohhhllama.fetch", %url, "wget transfer");
            run_tool(self.command(&program, url.as_str(), &output), self.name(), FILE_TIMEOUT)
                .await
                .map_err(tool_outcome)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_line_with_token() {
        let strategy = WgetStrategy::new("https://huggingface.co", Some("tok".to_string()));
        let cmd = strategy.command(
            Path::new("wget"),
            "https://huggingface.co/org/m/resolve/main/m.gguf",
            Path::new("/tmp/m.gguf"),
        );
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-c",
                "-q",
                "-O",
                "/tmp/m.gguf",
                "--header=Authorization: Bearer tok",
                "https://huggingface.co/org/m/resolve/main/m.gguf"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let strategy = WgetStrategy::with_program("no-such-wget-ohhhllama", "https://x", None);
        let request = FetchRequest::single("org/m", "m.gguf", PathBuf::from("/tmp"));
        assert!(matches!(
            strategy.fetch(&request).await,
            Err(StrategyError::Unavailable(_))
        ));
    }
}
