//! Docker CLI as the container backend.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use ohhhllama_core::{BackendError, ContainerBackend};
use tokio::process::Command;

use super::command_error;
use crate::process::run_tool;

const PULL_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
const SAVE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub struct DockerBackend {
    docker_bin: String,
}

impl DockerBackend {
    pub fn new(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
        }
    }

    fn pull_command(&self, image: &str) -> Command {
        let mut cmd = Command::new(&self.docker_bin);
        cmd.arg("pull").arg(image);
        cmd
    }

    fn save_command(&self, image: &str, archive: &Path) -> Command {
        let mut cmd = Command::new(&self.docker_bin);
        cmd.arg("save").arg("-o").arg(archive).arg(image);
        cmd
    }
}

#[async_trait]
impl ContainerBackend for DockerBackend {
    async fn pull(&self, image: &str) -> Result<(), BackendError> {
        run_tool(self.pull_command(image), "docker pull", PULL_TIMEOUT)
            .await
            .map_err(command_error)?;
        Ok(())
    }

    async fn save(&self, image: &str, archive: &Path) -> Result<(), BackendError> {
        if let Some(parent) = archive.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BackendError::Command(e.to_string()))?;
        }
        if let Err(e) = run_tool(self.save_command(image, archive), "docker save", SAVE_TIMEOUT).await
        {
            let _ = tokio::fs::remove_file(archive).await;
            return Err(command_error(e));
        }
        Ok(())
    }
}
