//! CLI bootstrap - the composition root.
//!
//! This module is the only place where infrastructure is wired together
//! for the CLI: the database, the metadata client, the inference backend,
//! the acquisition pipeline and the queue processor.

use std::sync::Arc;

use ohhhllama_acquire::{
    AcquisitionPipeline, OllamaBackend, ProcessorSettings, QueueProcessor, Resolver,
    SysinfoDiskProbe,
};
use ohhhllama_core::{AppConfig, InferenceBackend, MetadataClient, Stores, TokioSleeper};
use ohhhllama_db::{StoreFactory, setup_database};
use ohhhllama_hf::{DefaultHfClient, HfClientConfig};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Fully composed context shared by every command.
pub struct CliContext {
    pub config: AppConfig,
    pub stores: Stores,
}

/// Open the queue database.
pub async fn bootstrap(config: AppConfig) -> Result<CliContext, CliError> {
    tracing::debug!(
        target: "ohhhllama.paths",
        db_path = %config.db_path.display(),
        "CLI bootstrap"
    );
    let pool = setup_database(&config.db_path)
        .await
        .map_err(|e| CliError::Database(format!("{e:#}")))?;
    let stores = StoreFactory::build_stores(pool, config.rate_limit);
    Ok(CliContext { config, stores })
}

impl CliContext {
    pub fn metadata_client(&self) -> Result<Arc<dyn MetadataClient>, CliError> {
        let hf_config = HfClientConfig::new()
            .with_base_url(&self.config.metadata_url)
            .with_token(self.config.hf_token.clone());
        let client = DefaultHfClient::new(&hf_config)
            .map_err(|e| CliError::Config(format!("metadata client: {e}")))?;
        Ok(Arc::new(client))
    }

    pub fn resolver(&self) -> Result<Resolver, CliError> {
        Ok(Resolver::new(self.metadata_client()?))
    }

    pub fn inference_backend(&self) -> Result<Arc<dyn InferenceBackend>, CliError> {
        let backend = OllamaBackend::from_config(&self.config)
            .map_err(|e| CliError::Config(format!("inference backend: {e}")))?;
        Ok(Arc::new(backend))
    }

    /// The production processor: real pipeline, sysinfo disk probe, tokio sleep.
    pub fn processor(&self, cancel: CancellationToken) -> Result<QueueProcessor, CliError> {
        let pipeline = AcquisitionPipeline::standard(
            &self.config,
            self.metadata_client()?,
            self.inference_backend()?,
        )?;
        Ok(QueueProcessor::new(
            Arc::clone(&self.stores.jobs),
            Arc::new(pipeline),
            Arc::new(SysinfoDiskProbe),
            Arc::new(TokioSleeper),
            ProcessorSettings::from_config(&self.config),
        )
        .with_cancellation(cancel))
    }
}
