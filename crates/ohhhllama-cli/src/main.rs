//! CLI entry point - the composition root.
//!
//! Parses flags, installs logging, builds the configuration once and
//! dispatches to a handler. Every command, the server included, shares
//! the one store pool opened by the bootstrap.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ohhhllama_cli::{Cli, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.into_app_config()?;
    let ctx = bootstrap(config).await?;
    match cli.command {
        Commands::Serve { allowed_origins } => {
            handlers::serve::execute(&ctx, allowed_origins).await?;
        }
        Commands::Process => {
            let cancel = CancellationToken::new();
            let processor = ctx.processor(cancel.clone())?;
            let summary = handlers::process::execute(&processor, cancel).await?;
            if summary.failed > 0 {
                tracing::warn!(target: "ohhhllama.processor", failed = summary.failed, "Some jobs failed");
            }
        }
        Commands::Status => {
            handlers::status::execute(&ctx).await?;
        }
        Commands::Enqueue(target) => {
            handlers::enqueue::execute(&ctx, &target).await?;
        }
        Commands::Remove(target) => {
            handlers::remove::execute(&ctx, &target).await?;
        }
        Commands::Purge { older_than_days } => {
            handlers::purge::execute(&ctx, older_than_days).await?;
        }
        Commands::Check { repo, quant } => {
            let resolver = ctx.resolver()?;
            handlers::check::execute(&resolver, &repo, quant).await?;
        }
        Commands::ResetRate { origin } => {
            handlers::reset_rate::execute(&ctx, &origin).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
