//! [`MetadataClient`] implementation for [`HfClient`].

use crate::client::HfClient;
use crate::http::HttpBackend;
use async_trait::async_trait;
use ohhhllama_core::{MetadataClient, MetadataError};

#[async_trait]
impl<B: HttpBackend> MetadataClient for HfClient<B> {
    async fn list_files(&self, repo_id: &str) -> Result<Vec<String>, MetadataError> {
        let files = self
            .fetch_file_list(repo_id)
            .await
            .map_err(|e| e.into_metadata_error(repo_id))?;
        tracing::debug!(target: "ohhhllama.resolver", repo = %repo_id, count = files.len(), "listed repository files");
        Ok(files)
    }

    async fn architecture(&self, repo_id: &str) -> Result<Option<String>, MetadataError> {
        self.fetch_architecture(repo_id)
            .await
            .map_err(|e| e.into_metadata_error(repo_id))
    }
}
