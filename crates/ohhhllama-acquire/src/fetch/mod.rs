//! Moving repository files onto local disk.
//!
//! The [`Fetcher`] holds an ordered list of [`DownloadStrategy`]
//! implementations and tries them in turn until one leaves every requested
//! file on disk. Strategies that cannot run on this host report
//! [`StrategyError::Unavailable`] and are skipped without counting as a
//! failure of the fetch itself.

mod hf_cli;
mod http_stream;
mod wget;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ohhhllama_core::{AppConfig, DownloadStrategy, FetchRequest, SourceLocator, StrategyError};
use thiserror::Error;

pub use hf_cli::HfCliStrategy;
pub use http_stream::HttpStreamStrategy;
pub use wget::WgetStrategy;

/// Upper bound for one single-file transfer by an external tool.
pub const FILE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Upper bound for a whole raw snapshot by an external tool.
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// One strategy's outcome, kept for the final error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: &'static str,
    pub error: StrategyError,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no download strategies configured")]
    NoStrategies,

    #[error("all download strategies failed ({})", join_attempts(.attempts))]
    AllStrategiesFailed { attempts: Vec<StrategyAttempt> },

    #[error("snapshot of {repo_id} is missing {file}")]
    IncompleteSnapshot { repo_id: String, file: String },

    #[error("I/O error: {0}")]
    Io(String),
}

fn join_attempts(attempts: &[StrategyAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered fallback over download strategies.
pub struct Fetcher {
    strategies: Vec<Arc<dyn DownloadStrategy>>,
}

impl Fetcher {
    pub fn new(strategies: Vec<Arc<dyn DownloadStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: bulk-transfer tool, resumable HTTP client, plain streaming.
    pub fn standard(config: &AppConfig) -> Result<Self, FetchError> {
        let http = HttpStreamStrategy::new(&config.metadata_url, config.hf_token.clone())
            .map_err(|e| FetchError::Io(e.to_string()))?;
        Ok(Self::new(vec![
            Arc::new(HfCliStrategy::new(config.hf_token.clone())),
            Arc::new(WgetStrategy::new(&config.metadata_url, config.hf_token.clone())),
            Arc::new(http),
        ]))
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Fetch one file into `dest_dir`, returning its local path.
    pub async fn fetch_file(
        &self,
        source: &SourceLocator,
        dest_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        let request =
            FetchRequest::single(source.repo_id.clone(), source.file.clone(), dest_dir.to_path_buf());
        self.run(&request).await?;
        Ok(dest_dir.join(&source.file))
    }

    /// Fetch a raw model snapshot into `dest_dir`.
    ///
    /// The snapshot must include `config.json`; the converter cannot run
    /// without it.
    pub async fn fetch_snapshot(
        &self,
        repo_id: &str,
        files: Vec<String>,
        dest_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        let request = FetchRequest::snapshot(repo_id, files, dest_dir.to_path_buf());
        self.run(&request).await?;
        if !dest_dir.join("config.json").is_file() {
            return Err(FetchError::IncompleteSnapshot {
                repo_id: repo_id.to_string(),
                file: "config.json".to_string(),
            });
        }
        Ok(dest_dir.to_path_buf())
    }

    async fn run(&self, request: &FetchRequest) -> Result<(), FetchError> {
        if self.strategies.is_empty() {
            return Err(FetchError::NoStrategies);
        }
        tokio::fs::create_dir_all(&request.dest_dir)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {e}", request.dest_dir.display())))?;

        let mut attempts = Vec::new();
        for strategy in &self.strategies {
            tracing::info!(
                target: "ohhhllama.fetch",
                strategy = strategy.name(),
                repo = %request.repo_id,
                files = request.files.len(),
                "running"
            );
            let outcome = match strategy.fetch(request).await {
                Ok(()) => missing_file(request).map_or(Ok(()), |file| {
                    Err(StrategyError::Failed(format!("reported success but {file} is missing")))
                }),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {
                    tracing::info!(target: "ohhhllama.fetch", strategy = strategy.name(), repo = %request.repo_id, "completed");
                    return Ok(());
                }
                Err(error @ StrategyError::Unavailable(_)) => {
                    tracing::debug!(target: "ohhhllama.fetch", strategy = strategy.name(), %error, "skipped");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name(),
                        error,
                    });
                }
                Err(error) => {
                    tracing::warn!(target: "ohhhllama.fetch", strategy = strategy.name(), %error, "failed, trying next strategy");
                    attempts.push(StrategyAttempt {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }
        Err(FetchError::AllStrategiesFailed { attempts })
    }
}

/// First requested file that is not on disk after a strategy ran.
fn missing_file(request: &FetchRequest) -> Option<&str> {
    request
        .files
        .iter()
        .find(|f| !request.dest_dir.join(f.as_str()).is_file())
        .map(String::as_str)
}

/// Map a tool failure to a strategy outcome: missing tools are skipped.
pub(crate) fn tool_outcome(err: crate::process::ToolError) -> StrategyError {
    match err {
        crate::process::ToolError::NotFound { tool } => {
            StrategyError::Unavailable(format!("{tool} is not installed"))
        }
        other => StrategyError::Failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Unavailable,
        Fail,
        Write,
        ClaimWithoutWriting,
    }

    struct FakeStrategy {
        name: &'static str,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeStrategy {
        fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DownloadStrategy for FakeStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn resumable(&self) -> bool {
            false
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<(), StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Unavailable => Err(StrategyError::Unavailable("not here".to_string())),
                Behaviour::Fail => Err(StrategyError::Failed("boom".to_string())),
                Behaviour::ClaimWithoutWriting => Ok(()),
                Behaviour::Write => {
                    for file in &request.files {
                        std::fs::write(request.dest_dir.join(file), b"data").unwrap();
                    }
                    Ok(())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_first_working_strategy_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = FakeStrategy::new("a", Behaviour::Unavailable);
        let b = FakeStrategy::new("b", Behaviour::Write);
        let c = FakeStrategy::new("c", Behaviour::Write);
        let fetcher = Fetcher::new(vec![a.clone(), b.clone(), c.clone()]);

        let path = fetcher
            .fetch_file(&SourceLocator::new("org/m", "m.gguf"), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("m.gguf"));
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through_to_next() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(vec![
            FakeStrategy::new("a", Behaviour::Fail),
            FakeStrategy::new("b", Behaviour::Write),
        ]);
        assert!(
            fetcher
                .fetch_file(&SourceLocator::new("org/m", "m.gguf"), dir.path())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_success_without_file_is_not_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let b = FakeStrategy::new("b", Behaviour::Write);
        let fetcher = Fetcher::new(vec![
            FakeStrategy::new("a", Behaviour::ClaimWithoutWriting),
            b.clone(),
        ]);
        fetcher
            .fetch_file(&SourceLocator::new("org/m", "m.gguf"), dir.path())
            .await
            .unwrap();
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failed_lists_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(vec![
            FakeStrategy::new("a", Behaviour::Unavailable),
            FakeStrategy::new("b", Behaviour::Fail),
        ]);
        let err = fetcher
            .fetch_file(&SourceLocator::new("org/m", "m.gguf"), dir.path())
            .await
            .unwrap_err();
        match &err {
            FetchError::AllStrategiesFailed { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].strategy, "a");
                assert_eq!(attempts[1].error, StrategyError::Failed("boom".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("b: boom"));
    }

    #[tokio::test]
    async fn test_snapshot_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(vec![FakeStrategy::new("a", Behaviour::Write)]);
        let err = fetcher
            .fetch_snapshot("org/m", vec!["model.safetensors".to_string()], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::IncompleteSnapshot { .. }));

        let ok = fetcher
            .fetch_snapshot(
                "org/m",
                vec!["config.json".to_string(), "model.safetensors".to_string()],
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(ok, dir.path());
    }

    #[tokio::test]
    async fn test_no_strategies() {
        let dir = tempfile::tempdir().unwrap();
        let err = Fetcher::new(Vec::new())
            .fetch_file(&SourceLocator::new("org/m", "m.gguf"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoStrategies));
    }

    #[test]
    fn test_standard_chain_order() {
        let fetcher = Fetcher::standard(&AppConfig::default()).unwrap();
        assert_eq!(
            fetcher.strategy_names(),
            vec!["huggingface-cli", "wget", "http-stream"]
        );
    }
}
