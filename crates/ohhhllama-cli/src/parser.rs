//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;
use crate::config_args::ConfigArgs;

/// Deferred model acquisition for a shared inference host.
#[derive(Parser)]
#[command(name = "ohhhllama")]
#[command(about = "Queue model downloads and process them off-peak")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}
