//! HTTP backend abstraction for `HuggingFace` metadata.
//!
//! The trait lets the client be exercised against canned responses in
//! tests. The production implementation is a thin reqwest wrapper; retry
//! decisions belong to the queue processor, not to individual lookups.

use crate::config::HfClientConfig;
use crate::error::{HfError, HfResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

/// Trait for HTTP backends that can fetch JSON from URLs.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    ///
    /// Non-success statuses surface as [`HfError::Status`].
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> HfResult<T>;
}

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    pub fn new(config: &HfClientConfig) -> HfResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            auth_token: config.token.clone(),
        })
    }

    fn build_request(&self, url: &Url) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url.as_str());
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> HfResult<T> {
        let response = self.build_request(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HfError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| HfError::decode(url, &e))
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Canned response for the fake backend.
    #[derive(Clone)]
    pub enum CannedResponse {
        Json(serde_json::Value),
        Status(u16),
    }

    /// A fake HTTP backend that returns canned responses.
    ///
    /// When several patterns match a URL the longest one wins, so
    /// `org/model-GGUF` can be told apart from `org/model`.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Arc<Mutex<Vec<(String, CannedResponse)>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a canned response for a URL pattern.
        pub fn with_response(self, url_contains: &str, response: CannedResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push((url_contains.to_string(), response));
            self
        }

        pub fn with_json(self, url_contains: &str, json: serde_json::Value) -> Self {
            self.with_response(url_contains, CannedResponse::Json(json))
        }

        pub fn with_status(self, url_contains: &str, status: u16) -> Self {
            self.with_response(url_contains, CannedResponse::Status(status))
        }

        /// URLs requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn find_response(&self, url: &str) -> Option<CannedResponse> {
            let responses = self.responses.lock().unwrap();
            responses
                .iter()
                .filter(|(pattern, _)| url.contains(pattern.as_str()))
                .max_by_key(|(pattern, _)| pattern.len())
                .map(|(_, response)| response.clone())
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> HfResult<T> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.find_response(url.as_str()) {
                Some(CannedResponse::Json(json)) => {
                    serde_json::from_value(json).map_err(|e| HfError::decode(url, &e))
                }
                Some(CannedResponse::Status(status)) => Err(HfError::Status {
                    status,
                    url: url.to_string(),
                }),
                None => Err(HfError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }
}
