//! `HuggingFace` client for repository metadata.

mod repo_files;

use crate::config::HfClientConfig;
use crate::error::HfResult;
use crate::http::{HttpBackend, ReqwestBackend};

/// Default `HuggingFace` client using the reqwest HTTP backend.
pub type DefaultHfClient = HfClient<ReqwestBackend>;

/// Client for the `HuggingFace` Hub.
///
/// Generic over the HTTP backend so lookups can be tested against canned
/// responses. Production code uses [`DefaultHfClient`] through the
/// [`MetadataClient`](ohhhllama_core::MetadataClient) port.
pub struct HfClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: HfClientConfig,
}

impl DefaultHfClient {
    pub fn new(config: &HfClientConfig) -> HfResult<Self> {
        let backend = ReqwestBackend::new(config)?;
        Ok(Self {
            backend,
            config: config.clone(),
        })
    }
}

impl<B: HttpBackend> HfClient<B> {
    #[cfg(test)]
    pub(crate) const fn with_backend(config: HfClientConfig, backend: B) -> Self {
        Self { backend, config }
    }
}
