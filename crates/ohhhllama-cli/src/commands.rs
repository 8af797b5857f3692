//! Subcommands.

use clap::{ArgGroup, Args, Subcommand};
use ohhhllama_core::{Quantization, RepoDescriptor, Subject};

use crate::error::CliError;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the intake HTTP server
    Serve {
        /// Allowed CORS origins (all origins when omitted)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },

    /// Process the queue once: recover orphans, then run every pending job
    Process,

    /// Show queue counts, active jobs and recent history
    Status,

    /// Add a job to the queue
    Enqueue(EnqueueTarget),

    /// Remove a job that has not started yet
    Remove(EnqueueTarget),

    /// Delete finished jobs older than the retention window
    Purge {
        /// Retention in days [default: 30]
        #[arg(long)]
        older_than_days: Option<u64>,
    },

    /// Show how a repository would be acquired, without downloading anything
    Check {
        /// Repository id, e.g. "org/model"
        repo: String,
        /// Desired quantization
        #[arg(long, default_value_t = Quantization::default())]
        quant: Quantization,
    },

    /// Reset today's request counter for a client address
    ResetRate {
        /// Client address as recorded at intake
        origin: String,
    },
}

/// Exactly one of `--model`, `--repo` or `--image`.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["model", "repo", "image"])))]
pub struct EnqueueTarget {
    /// Model the inference backend can pull by name
    #[arg(long)]
    pub model: Option<String>,

    /// Repository to acquire, e.g. "org/model-GGUF"
    #[arg(long)]
    pub repo: Option<String>,

    /// Quantization for --repo [default: Q4_K_M]
    #[arg(long, requires = "repo")]
    pub quant: Option<Quantization>,

    /// Name to register the model under (--repo only)
    #[arg(long, requires = "repo")]
    pub name: Option<String>,

    /// Stop after downloading the raw files (--repo only)
    #[arg(long, requires = "repo")]
    pub no_convert: bool,

    /// Container image reference
    #[arg(long)]
    pub image: Option<String>,
}

impl EnqueueTarget {
    pub fn subject(&self) -> Result<Subject, CliError> {
        let subject = match (&self.model, &self.repo, &self.image) {
            (Some(model), None, None) => Subject::binary(model.trim()),
            (None, Some(repo), None) => {
                let mut desc = RepoDescriptor::new(repo.trim())
                    .with_quant(self.quant.unwrap_or_default())
                    .with_convert(!self.no_convert);
                if let Some(name) = &self.name {
                    desc = desc.with_dest_name(name);
                }
                Subject::RepositoryAcquire(desc)
            }
            (None, None, Some(image)) => Subject::container(image.trim()),
            _ => {
                return Err(CliError::Arguments(
                    "exactly one of --model, --repo or --image is required".to_string(),
                ));
            }
        };
        subject.validate().map_err(CliError::Arguments)?;
        Ok(subject)
    }
}
