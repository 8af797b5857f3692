//! Application configuration.
//!
//! [`AppConfig`] is built once at startup (by the CLI from flags and
//! environment) and handed to every component constructor. Nothing reads
//! configuration from globals after that point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::CoreError;
use crate::retry::{Backoff, RetryPolicy};

/// Default daily request ceiling per client address.
pub const DEFAULT_RATE_LIMIT: u32 = 5;

/// Default listen port (the inference API's well-known port).
pub const DEFAULT_LISTEN_PORT: u16 = 11434;

/// Default inference backend address.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:11435";

/// Default metadata service.
pub const DEFAULT_METADATA_URL: &str = "https://huggingface.co";

/// Default disk usage percentage above which jobs fail fast.
pub const DEFAULT_DISK_THRESHOLD: f64 = 90.0;

/// Runtime configuration shared by all components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub backend_url: String,
    pub db_path: PathBuf,
    pub rate_limit: u32,

    /// Holding area for raw repository files and fetched artifacts.
    pub holding_dir: PathBuf,
    /// Where final quantized artifacts are written.
    pub artifact_dir: PathBuf,
    /// Where container image archives are written.
    pub archive_dir: PathBuf,

    pub llama_cpp_dir: PathBuf,
    pub python_bin: String,
    pub ollama_bin: String,
    pub docker_bin: String,

    pub metadata_url: String,
    #[serde(skip_serializing)]
    pub hf_token: Option<String>,

    /// `SYSTEM` block written into every generated manifest.
    pub system_prompt: Option<String>,
    /// `TEMPLATE` block written into every generated manifest.
    pub chat_template: Option<String>,

    pub disk_threshold_percent: f64,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub job_pause: Duration,
    pub purge_after: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        let holding_dir = PathBuf::from("/data/huggingface");
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            db_path: PathBuf::from("/var/lib/ohhhllama/queue.db"),
            rate_limit: DEFAULT_RATE_LIMIT,
            artifact_dir: holding_dir.join("gguf"),
            archive_dir: PathBuf::from("/data/images"),
            holding_dir,
            llama_cpp_dir: PathBuf::from("/opt/llama.cpp"),
            python_bin: "python3".to_string(),
            ollama_bin: "ollama".to_string(),
            docker_bin: "docker".to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            hf_token: None,
            system_prompt: None,
            chat_template: None,
            disk_threshold_percent: DEFAULT_DISK_THRESHOLD,
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
            job_pause: Duration::from_secs(5),
            purge_after: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl AppConfig {
    /// Check invariants that would otherwise surface as confusing runtime failures.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.rate_limit == 0 {
            return Err(CoreError::Configuration(
                "rate limit must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Configuration(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if !(self.disk_threshold_percent > 0.0 && self.disk_threshold_percent <= 100.0) {
            return Err(CoreError::Configuration(format!(
                "disk threshold must be in (0, 100], got {}",
                self.disk_threshold_percent
            )));
        }
        for (name, url) in [
            ("backend url", &self.backend_url),
            ("metadata url", &self.metadata_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CoreError::Configuration(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    /// Retry policy used by the queue processor.
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Backoff::Fixed(self.retry_delay),
        }
    }

    /// Directory for per-job scratch space (raw downloads, intermediates).
    pub fn scratch_dir(&self) -> PathBuf {
        self.holding_dir.join("tmp")
    }
}
