//! Bulk transfer through the `huggingface-cli` tool.

use async_trait::async_trait;
use ohhhllama_core::{DownloadStrategy, FetchRequest, StrategyError};
use tokio::process::Command;

use super::{FILE_TIMEOUT, SNAPSHOT_TIMEOUT, tool_outcome};
use crate::process::{locate, run_tool};

pub struct HfCliStrategy {
    program: String,
    token: Option<String>,
}

impl HfCliStrategy {
    pub fn new(token: Option<String>) -> Self {
        Self::with_program("huggingface-cli", token)
    }

    pub fn with_program(program: impl Into<String>, token: Option<String>) -> Self {
        Self {
            program: program.into(),
            token,
        }
    }

    fn command(&self, program: &std::path::Path, request: &FetchRequest) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("download").arg(&request.repo_id);
        for file in &request.files {
            cmd.arg(file);
        }
        cmd.arg("--local-dir").arg(&request.dest_dir);
        if let Some(token) = &self.token {
            cmd.arg("--token").arg(token);
        }
        cmd.env("HF_HUB_DISABLE_TELEMETRY", "1");
        cmd
    }
}

#[async_trait]
impl DownloadStrategy for HfCliStrategy {
    fn name(&self) -> &'static str {
        "huggingface-cli"
    }

    fn resumable(&self) -> bool {
        true
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<(), StrategyError> {
        let program = locate(&self.program).map_err(tool_outcome)?;
        let timeout = if request.files.len() > 1 {
            SNAPSHOT_TIMEOUT
        } else {
            FILE_TIMEOUT
        };
        run_tool(self.command(&program, request), self.name(), timeout)
            .await
            .map_err(tool_outcome)?;
        Ok(())
    }
}
