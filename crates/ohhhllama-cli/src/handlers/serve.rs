//! `ohhhllama serve`: the intake HTTP server.

use ohhhllama_axum::{ServerConfig, ServerContext, start_server};

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, allowed_origins: Vec<String>) -> Result<(), CliError> {
    let mut server = ServerConfig::from_app_config(&ctx.config);
    if !allowed_origins.is_empty() {
        server = server.with_allowed_origins(allowed_origins);
    }
    let server_ctx = ServerContext::production(ctx.stores.clone(), &ctx.config)?;
    start_server(server_ctx, server).await?;
    Ok(())
}
