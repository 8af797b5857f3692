//! File listing and architecture lookups.

use super::HfClient;
use crate::error::HfResult;
use crate::http::HttpBackend;
use crate::models::{ModelConfig, ModelInfo};
use crate::url::{config_url, model_info_url};

impl<B: HttpBackend> HfClient<B> {
    /// All filenames in a repository, sorted.
    pub(crate) async fn fetch_file_list(&self, repo_id: &str) -> HfResult<Vec<String>> {
        let url = model_info_url(self.config.base_url(), repo_id)?;
        let info: ModelInfo = self.backend.get_json(&url).await?;
        let mut files: Vec<String> = info.siblings.into_iter().map(|s| s.rfilename).collect();
        files.sort();
        Ok(files)
    }

    /// First entry of `architectures` in the repository's `config.json`.
    ///
    /// A missing config is not an error; unknown repositories are reported by
    /// the file listing instead.
    pub(crate) async fn fetch_architecture(&self, repo_id: &str) -> HfResult<Option<String>> {
        let url = config_url(self.config.base_url(), repo_id)?;
        match self.backend.get_json::<ModelConfig>(&url).await {
            Ok(config) => Ok(config.architectures.into_iter().next()),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HfClientConfig;
    use crate::error::HfError;
    use crate::http::testing::FakeBackend;
    use serde_json::json;

    fn client(backend: FakeBackend) -> HfClient<FakeBackend> {
        HfClient::with_backend(HfClientConfig::default(), backend)
    }

    #[tokio::test]
    async fn test_file_list_is_sorted() {
        let backend = FakeBackend::new().with_json(
            "api/models/org/model",
            json!({"siblings": [
                {"rfilename": "model.Q8_0.gguf"},
                {"rfilename": "README.md"},
                {"rfilename": "model.Q4_K_M.gguf"}
            ]}),
        );
        let files = client(backend).fetch_file_list("org/model").await.unwrap();
        assert_eq!(files, vec!["README.md", "model.Q4_K_M.gguf", "model.Q8_0.gguf"]);
    }

    #[tokio::test]
    async fn test_architecture_first_entry() {
        let backend = FakeBackend::new().with_json(
            "org/model/raw/main/config.json",
            json!({"architectures": ["LlamaForCausalLM", "Other"]}),
        );
        let arch = client(backend).fetch_architecture("org/model").await.unwrap();
        assert_eq!(arch.as_deref(), Some("LlamaForCausalLM"));
    }

    #[tokio::test]
    async fn test_missing_config_is_none() {
        let arch = client(FakeBackend::new())
            .fetch_architecture("org/model")
            .await
            .unwrap();
        assert!(arch.is_none());
    }

    #[tokio::test]
    async fn test_gated_config_propagates() {
        let backend = FakeBackend::new().with_status("config.json", 403);
        let err = client(backend)
            .fetch_architecture("org/model")
            .await
            .unwrap_err();
        assert!(matches!(err, HfError::Status { status: 403, .. }));
    }
}
