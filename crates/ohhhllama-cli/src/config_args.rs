//! Configuration flags shared by every subcommand.
//!
//! Each flag can also come from the environment, using the variable names
//! existing deployments already set.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use ohhhllama_core::AppConfig;
use ohhhllama_core::config::{
    DEFAULT_BACKEND_URL, DEFAULT_DISK_THRESHOLD, DEFAULT_LISTEN_PORT, DEFAULT_METADATA_URL,
    DEFAULT_RATE_LIMIT,
};

use crate::error::CliError;

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Inference backend base URL
    #[arg(long = "backend", env = "OLLAMA_BACKEND", default_value = DEFAULT_BACKEND_URL, global = true)]
    pub backend_url: String,

    /// Address the intake server binds to
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0", global = true)]
    pub listen_host: IpAddr,

    /// Port the intake server listens on
    #[arg(long = "port", env = "LISTEN_PORT", default_value_t = DEFAULT_LISTEN_PORT, global = true)]
    pub listen_port: u16,

    /// Queue database file
    #[arg(long, env = "DB_PATH", default_value = "/var/lib/ohhhllama/queue.db", global = true)]
    pub db_path: PathBuf,

    /// Requests per client per day
    #[arg(long, env = "RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT, global = true)]
    pub rate_limit: u32,

    /// Holding area for raw repository files
    #[arg(long = "hf-cache-dir", env = "HF_CACHE_DIR", default_value = "/data/huggingface", global = true)]
    pub holding_dir: PathBuf,

    /// Output directory for converted artifacts [default: <hf-cache-dir>/gguf]
    #[arg(long = "gguf-dir", env = "GGUF_OUTPUT_DIR", global = true)]
    pub artifact_dir: Option<PathBuf>,

    /// Output directory for container image archives
    #[arg(long = "images-dir", env = "IMAGES_DIR", default_value = "/data/images", global = true)]
    pub archive_dir: PathBuf,

    /// llama.cpp checkout holding the conversion script and quantize tool
    #[arg(long, env = "LLAMA_CPP_DIR", default_value = "/opt/llama.cpp", global = true)]
    pub llama_cpp_dir: PathBuf,

    #[arg(long, env = "PYTHON_BIN", default_value = "python3", global = true)]
    pub python_bin: String,

    #[arg(long, env = "OLLAMA_BIN", default_value = "ollama", global = true)]
    pub ollama_bin: String,

    #[arg(long, env = "DOCKER_BIN", default_value = "docker", global = true)]
    pub docker_bin: String,

    /// Model metadata service
    #[arg(long = "hf-endpoint", env = "HF_ENDPOINT", default_value = DEFAULT_METADATA_URL, global = true)]
    pub metadata_url: String,

    /// Access token for gated or private repositories
    #[arg(long, env = "HF_TOKEN", hide_env_values = true, global = true)]
    pub hf_token: Option<String>,

    /// System prompt written into the manifest of every imported model
    #[arg(long, env = "MODEL_SYSTEM_PROMPT", global = true)]
    pub system_prompt: Option<String>,

    /// Chat template written into the manifest of every imported model
    #[arg(long, env = "MODEL_TEMPLATE", global = true)]
    pub chat_template: Option<String>,

    /// Disk usage percent above which jobs fail without downloading
    #[arg(long, env = "DISK_THRESHOLD", default_value_t = DEFAULT_DISK_THRESHOLD, global = true)]
    pub disk_threshold: f64,

    /// Attempts per job before it is marked failed
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3, global = true)]
    pub max_attempts: u32,

    /// Seconds between attempts
    #[arg(long, env = "RETRY_DELAY", default_value_t = 30, global = true)]
    pub retry_delay_secs: u64,

    /// Seconds between jobs
    #[arg(long, env = "JOB_PAUSE", default_value_t = 5, global = true)]
    pub job_pause_secs: u64,
}

impl ConfigArgs {
    /// Build and validate the runtime configuration.
    pub fn into_app_config(self) -> Result<AppConfig, CliError> {
        let artifact_dir = self
            .artifact_dir
            .unwrap_or_else(|| self.holding_dir.join("gguf"));
        let config = AppConfig {
            listen_addr: SocketAddr::new(self.listen_host, self.listen_port),
            backend_url: self.backend_url,
            db_path: self.db_path,
            rate_limit: self.rate_limit,
            holding_dir: self.holding_dir,
            artifact_dir,
            archive_dir: self.archive_dir,
            llama_cpp_dir: self.llama_cpp_dir,
            python_bin: self.python_bin,
            ollama_bin: self.ollama_bin,
            docker_bin: self.docker_bin,
            metadata_url: self.metadata_url,
            hf_token: self.hf_token.filter(|t| !t.trim().is_empty()),
            system_prompt: self.system_prompt.filter(|s| !s.trim().is_empty()),
            chat_template: self.chat_template.filter(|s| !s.trim().is_empty()),
            disk_threshold_percent: self.disk_threshold,
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            job_pause: Duration::from_secs(self.job_pause_secs),
            ..AppConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
