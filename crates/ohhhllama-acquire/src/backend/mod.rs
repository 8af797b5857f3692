//! Adapters for the inference and container backends.

mod docker;
mod ollama;

pub use docker::DockerBackend;
pub use ollama::OllamaBackend;

use crate::process::ToolError;
use ohhhllama_core::BackendError;

fn command_error(err: ToolError) -> BackendError {
    BackendError::Command(err.to_string())
}

#[cfg(test)]
pub mod testing {
    //! Recording fakes for the backend ports.

    use async_trait::async_trait;
    use ohhhllama_core::{BackendError, ContainerBackend, InferenceBackend};
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeInference {
        installed: Mutex<Vec<String>>,
        pulls: Mutex<Vec<String>>,
        imports: Mutex<Vec<(String, String)>>,
        import_failure: Option<String>,
        pull_failure: Option<String>,
    }

    impl FakeInference {
        pub fn with_installed(self, name: &str) -> Self {
            self.installed.lock().unwrap().push(name.to_string());
            self
        }

        pub fn failing_import(mut self, reason: &str) -> Self {
            self.import_failure = Some(reason.to_string());
            self
        }

        pub fn failing_pull(mut self, reason: &str) -> Self {
            self.pull_failure = Some(reason.to_string());
            self
        }

        pub fn pulls(&self) -> Vec<String> {
            self.pulls.lock().unwrap().clone()
        }

        /// `(name, manifest contents)` for every import call.
        pub fn imports(&self) -> Vec<(String, String)> {
            self.imports.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceBackend for FakeInference {
        async fn list_installed(&self) -> Result<Vec<String>, BackendError> {
            Ok(self.installed.lock().unwrap().clone())
        }

        async fn pull(&self, name: &str) -> Result<(), BackendError> {
            self.pulls.lock().unwrap().push(name.to_string());
            if let Some(reason) = &self.pull_failure {
                return Err(BackendError::Unreachable(reason.clone()));
            }
            self.installed.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn delete(&self, name: &str) -> Result<(), BackendError> {
            self.installed.lock().unwrap().retain(|n| n != name);
            Ok(())
        }

        async fn import(&self, name: &str, manifest: &Path) -> Result<(), BackendError> {
            let contents = std::fs::read_to_string(manifest)
                .map_err(|e| BackendError::Command(e.to_string()))?;
            self.imports
                .lock()
                .unwrap()
                .push((name.to_string(), contents));
            if let Some(reason) = &self.import_failure {
                return Err(BackendError::Command(reason.clone()));
            }
            self.installed.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn ping(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeContainers {
        pub pulls: Mutex<Vec<String>>,
        pub saves: Mutex<Vec<(String, std::path::PathBuf)>>,
    }

    #[async_trait]
    impl ContainerBackend for FakeContainers {
        async fn pull(&self, image: &str) -> Result<(), BackendError> {
            self.pulls.lock().unwrap().push(image.to_string());
            Ok(())
        }

        async fn save(&self, image: &str, archive: &Path) -> Result<(), BackendError> {
            std::fs::write(archive, image).map_err(|e| BackendError::Command(e.to_string()))?;
            self.saves
                .lock()
                .unwrap()
                .push((image.to_string(), archive.to_path_buf()));
            Ok(())
        }
    }
}
