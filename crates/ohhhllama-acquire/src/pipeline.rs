//! Per-job acquisition: dispatch by subject kind and run each step.
//!
//! Every step logs `running` and then `completed` or `failed` under the
//! job id, so an operator can follow a job through the log. Step failures
//! are mapped onto [`AcquireError`]: resolver verdicts may be permanent,
//! everything else is transient and left to the processor's retry policy.

use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ohhhllama_core::{
    AcquireError, AppConfig, ContainerBackend, InferenceBackend, Job, JobId, MetadataClient,
    ModelConverter, Plan, Quantization, RepoDescriptor, Stage, Subject, archive_name_for_image,
    ports::is_installed,
};

use crate::backend::DockerBackend;
use crate::convert::{LlamaCppConverter, artifact_name, intermediate_name};
use crate::fetch::{FetchError, Fetcher};
use crate::import::{Importer, ManifestDefaults};
use crate::processor::JobExecutor;
use crate::resolver::Resolver;

/// Filesystem locations the pipeline writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDirs {
    /// Raw snapshots and artifacts kept without import.
    pub holding: PathBuf,
    /// Final artifacts handed to the inference backend.
    pub artifacts: PathBuf,
    /// Container image archives.
    pub archives: PathBuf,
    /// Per-job scratch space, removed after each attempt.
    pub scratch: PathBuf,
}

impl PipelineDirs {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            holding: config.holding_dir.clone(),
            artifacts: config.artifact_dir.clone(),
            archives: config.archive_dir.clone(),
            scratch: config.scratch_dir(),
        }
    }
}

async fn step<T, E, F>(job: JobId, name: &'static str, fut: F) -> Result<T, E>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    tracing::info!(target: "ohhhllama.processor", job_id = %job, step = name, "running");
    match fut.await {
        Ok(value) => {
            tracing::info!(target: "ohhhllama.processor", job_id = %job, step = name, "completed");
            Ok(value)
        }
        Err(e) => {
            tracing::warn!(target: "ohhhllama.processor", job_id = %job, step = name, error = %e, "failed");
            Err(e)
        }
    }
}

fn transient<E: Display>(stage: Stage) -> impl FnOnce(E) -> AcquireError {
    move |e| AcquireError::transient(stage, e.to_string())
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // Different filesystems: copy, then drop the source.
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

pub struct AcquisitionPipeline {
    resolver: Resolver,
    fetcher: Fetcher,
    converter: Arc<dyn ModelConverter>,
    inference: Arc<dyn InferenceBackend>,
    containers: Arc<dyn ContainerBackend>,
    dirs: PipelineDirs,
    manifest: ManifestDefaults,
}

impl AcquisitionPipeline {
    pub fn new(
        resolver: Resolver,
        fetcher: Fetcher,
        converter: Arc<dyn ModelConverter>,
        inference: Arc<dyn InferenceBackend>,
        containers: Arc<dyn ContainerBackend>,
        dirs: PipelineDirs,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            converter,
            inference,
            containers,
            dirs,
            manifest: ManifestDefaults::default(),
        }
    }

    /// SYSTEM and TEMPLATE blocks for every manifest this pipeline writes.
    #[must_use]
    pub fn with_manifest_defaults(mut self, manifest: ManifestDefaults) -> Self {
        self.manifest = manifest;
        self
    }

    /// Production wiring: standard fetch chain, llama.cpp converter, docker CLI.
    pub fn standard(
        config: &AppConfig,
        metadata: Arc<dyn MetadataClient>,
        inference: Arc<dyn InferenceBackend>,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(
            Resolver::new(metadata),
            Fetcher::standard(config)?,
            Arc::new(LlamaCppConverter::from_config(config)),
            inference,
            Arc::new(DockerBackend::new(&config.docker_bin)),
            PipelineDirs::from_config(config),
        )
        .with_manifest_defaults(ManifestDefaults::from_config(config)))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    async fn binary_pull(&self, id: JobId, name: &str) -> Result<(), AcquireError> {
        let installed = step(id, "check", self.inference.list_installed())
            .await
            .map_err(transient(Stage::Pull))?;
        if is_installed(&installed, name) {
            tracing::info!(target: "ohhhllama.processor", job_id = %id, model = %name, "already installed; nothing to do");
            return Ok(());
        }
        step(id, "pull", self.inference.pull(name))
            .await
            .map_err(transient(Stage::Pull))
    }

    async fn container_pull(&self, id: JobId, image: &str) -> Result<(), AcquireError> {
        step(id, "container pull", self.containers.pull(image))
            .await
            .map_err(transient(Stage::Pull))?;

        tokio::fs::create_dir_all(&self.dirs.archives)
            .await
            .map_err(transient(Stage::Archive))?;
        let archive = self.dirs.archives.join(archive_name_for_image(image));
        step(id, "archive", self.containers.save(image, &archive))
            .await
            .map_err(transient(Stage::Archive))?;
        tracing::info!(target: "ohhhllama.processor", job_id = %id, archive = %archive.display(), "image archived");
        Ok(())
    }

    async fn repository(&self, id: JobId, desc: &RepoDescriptor) -> Result<(), AcquireError> {
        let plan = step(id, "select", self.resolver.resolve(&desc.repo_id, desc.quant)).await?;
        let name = desc.target_name();

        match plan {
            Plan::Unsupported { reason } => Err(AcquireError::unsupported(reason.to_string())),

            Plan::DirectArtifact { source, .. } => {
                // Artifacts land in a stable location so resumable strategies
                // can pick up where a failed attempt stopped.
                let dest = if desc.convert {
                    self.dirs.artifacts.clone()
                } else {
                    self.dirs.holding.join(&name)
                };
                let artifact = step(id, "fetch", self.fetcher.fetch_file(&source, &dest))
                    .await
                    .map_err(transient(Stage::Fetch))?;
                if !desc.convert {
                    tracing::info!(target: "ohhhllama.processor", job_id = %id, path = %artifact.display(), "kept in holding area without import");
                    return Ok(());
                }
                self.import(id, &artifact, &name).await
            }

            Plan::ConvertibleSource { repo_id, files, .. } => {
                if !desc.convert {
                    let dest = self.dirs.holding.join(&name);
                    step(id, "fetch", self.fetcher.fetch_snapshot(&repo_id, files, &dest))
                        .await
                        .map_err(transient(Stage::Fetch))?;
                    tracing::info!(target: "ohhhllama.processor", job_id = %id, path = %dest.display(), "raw files kept in holding area");
                    return Ok(());
                }
                self.convert_and_import(id, &repo_id, files, &name, desc.quant)
                    .await
            }
        }
    }

    async fn convert_and_import(
        &self,
        id: JobId,
        repo_id: &str,
        files: Vec<String>,
        name: &str,
        quant: Quantization,
    ) -> Result<(), AcquireError> {
        let scratch = self.job_dir(id).await?;
        let raw_dir = scratch.path().join("raw");

        step(id, "fetch", self.fetcher.fetch_snapshot(repo_id, files, &raw_dir))
            .await
            .map_err(transient(Stage::Fetch))?;

        let intermediate = scratch.path().join(intermediate_name(name));
        step(id, "convert", self.converter.convert(&raw_dir, &intermediate))
            .await
            .map_err(transient(Stage::Convert))?;
        // Raw weights are no longer needed once converted.
        let _ = tokio::fs::remove_dir_all(&raw_dir).await;

        tokio::fs::create_dir_all(&self.dirs.artifacts)
            .await
            .map_err(transient(Stage::Quantize))?;
        let artifact = self.dirs.artifacts.join(artifact_name(name, quant));
        if quant == Quantization::F16 {
            move_file(&intermediate, &artifact)
                .await
                .map_err(transient(Stage::Convert))?;
        } else {
            step(
                id,
                "quantize",
                self.converter.quantize(&intermediate, &artifact, quant),
            )
            .await
            .map_err(transient(Stage::Quantize))?;
            let _ = tokio::fs::remove_file(&intermediate).await;
        }

        self.import(id, &artifact, name).await
    }

    async fn import(&self, id: JobId, artifact: &Path, name: &str) -> Result<(), AcquireError> {
        let importer = Importer::new(self.inference.clone()).with_defaults(self.manifest.clone());
        step(id, "import", importer.import(artifact, name))
            .await
            .map_err(transient(Stage::Import))?;
        Ok(())
    }

    /// Fresh scratch directory for one attempt, removed when dropped.
    async fn job_dir(&self, id: JobId) -> Result<tempfile::TempDir, AcquireError> {
        tokio::fs::create_dir_all(&self.dirs.scratch)
            .await
            .map_err(transient(Stage::Fetch))?;
        tempfile::Builder::new()
            .prefix(&format!("job-{id}-"))
            .tempdir_in(&self.dirs.scratch)
            .map_err(transient(Stage::Fetch))
    }
}

#[async_trait]
impl JobExecutor for AcquisitionPipeline {
    async fn execute(&self, job: &Job) -> Result<(), AcquireError> {
        match &job.subject {
            Subject::BinaryPull { name } => self.binary_pull(job.id, name).await,
            Subject::RepositoryAcquire(desc) => self.repository(job.id, desc).await,
            Subject::ContainerPull { image } => self.container_pull(job.id, image).await,
        }
    }
}
