//! In-crate fakes for handler and intake tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use ohhhllama_core::{BackendError, DiskError, DiskProbe, InferenceBackend};

#[derive(Default)]
pub struct FakeBackend {
    installed: Vec<String>,
    unreachable: bool,
    delay: Option<Duration>,
}

impl FakeBackend {
    pub fn with_installed(names: &[&str]) -> Self {
        Self {
            installed: names.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn reach(&self) -> Result<(), BackendError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(BackendError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl InferenceBackend for FakeBackend {
    async fn list_installed(&self) -> Result<Vec<String>, BackendError> {
        self.reach().await?;
        Ok(self.installed.clone())
    }

    async fn pull(&self, _name: &str) -> Result<(), BackendError> {
        self.reach().await
    }

    async fn delete(&self, _name: &str) -> Result<(), BackendError> {
        self.reach().await
    }

    async fn import(&self, _name: &str, _manifest: &Path) -> Result<(), BackendError> {
        self.reach().await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.reach().await
    }
}

/// Disk probe reporting a fixed usage, or an error when `None`.
pub struct FixedDisk(pub Option<f64>);

impl DiskProbe for FixedDisk {
    fn usage_percent(&self, path: &Path) -> Result<f64, DiskError> {
        self.0
            .ok_or_else(|| DiskError::NoDisk(path.display().to_string()))
    }
}
