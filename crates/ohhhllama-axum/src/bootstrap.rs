//! Axum server bootstrap - the composition root for the HTTP surface.
//!
//! The inference backend and the disk probe are instantiated here and
//! nowhere else in this crate. Stores arrive already opened.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ohhhllama_acquire::{OllamaBackend, SysinfoDiskProbe};
use ohhhllama_core::{AppConfig, DiskProbe, InferenceBackend, Stores};
use tokio::net::TcpListener;

use crate::intake::IntakeService;

/// Upper bound on each health probe.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins.
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            listen_addr: config.listen_addr,
            cors: CorsConfig::default(),
        }
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Disk check parameters for the health endpoint.
#[derive(Debug, Clone)]
pub struct DiskCheck {
    pub path: PathBuf,
    pub threshold_percent: f64,
}

/// Everything the handlers need.
pub struct ServerContext {
    pub stores: Stores,
    pub intake: IntakeService,
    pub backend: Arc<dyn InferenceBackend>,
    pub disk: Arc<dyn DiskProbe>,
    pub disk_check: DiskCheck,
    pub probe_timeout: Duration,
}

impl ServerContext {
    pub fn new(
        stores: Stores,
        backend: Arc<dyn InferenceBackend>,
        disk: Arc<dyn DiskProbe>,
        config: &AppConfig,
    ) -> Self {
        let intake = IntakeService::new(stores.clone(), Some(Arc::clone(&backend)));
        Self {
            stores,
            intake,
            backend,
            disk,
            disk_check: DiskCheck {
                path: config.holding_dir.clone(),
                threshold_percent: config.disk_threshold_percent,
            },
            probe_timeout: HEALTH_PROBE_TIMEOUT,
        }
    }

    /// Wire the production inference backend and disk probe around
    /// already-opened stores.
    pub fn production(stores: Stores, config: &AppConfig) -> Result<Self> {
        tracing::info!(
            target: "ohhhllama.paths",
            db_path = %config.db_path.display(),
            holding_dir = %config.holding_dir.display(),
            backend = %config.backend_url,
            "Axum bootstrap resolved paths"
        );
        let backend: Arc<dyn InferenceBackend> = Arc::new(OllamaBackend::from_config(config)?);
        let disk: Arc<dyn DiskProbe> = Arc::new(SysinfoDiskProbe);
        Ok(Self::new(stores, backend, disk, config))
    }
}

/// Serve the intake API until ctrl-c.
pub async fn start_server(ctx: ServerContext, server: ServerConfig) -> Result<()> {
    let rate_limit = ctx.stores.rate_limiter.limit();
    let app = crate::routes::create_router(ctx, &server.cors);

    let listener = TcpListener::bind(server.listen_addr).await?;
    tracing::info!(
        target: "ohhhllama.intake",
        addr = %server.listen_addr,
        rate_limit,
        "ohhhllama intake listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "ohhhllama.intake", error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "ohhhllama.intake", "Shutting down");
}
