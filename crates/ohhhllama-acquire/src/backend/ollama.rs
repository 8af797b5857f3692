//! Ollama as the inference backend.
//!
//! Listing, pulling, deleting and health checks use the HTTP API. Import
//! goes through `ollama create`, which needs the manifest on the local
//! filesystem, pointed at the same server through `OLLAMA_HOST`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use ohhhllama_core::{AppConfig, BackendError, InferenceBackend};
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

use super::command_error;
use crate::process::run_tool;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const QUICK_TIMEOUT: Duration = Duration::from_secs(30);
const PULL_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);
const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    ollama_bin: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, ollama_bin: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ollama_bin: ollama_bin.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, BackendError> {
        Self::new(&config.backend_url, &config.ollama_bin)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `host:port` form expected by the CLI's `OLLAMA_HOST`.
    fn host(&self) -> &str {
        self.base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_default()
            .trim()
            .to_string();
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn unreachable(err: &reqwest::Error) -> BackendError {
    BackendError::Unreachable(err.to_string())
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn list_installed(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(QUICK_TIMEOUT)
            .send()
            .await
            .map_err(|e| unreachable(&e))?;
        let tags: TagsResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| unreachable(&e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull(&self, name: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url("/api/pull"))
            .timeout(PULL_TIMEOUT)
            .json(&json!({ "name": name, "stream": false }))
            .send()
            .await
            .map_err(|e| unreachable(&e))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url("/api/delete"))
            .timeout(QUICK_TIMEOUT)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| unreachable(&e))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn import(&self, name: &str, manifest: &Path) -> Result<(), BackendError> {
        let mut cmd = Command::new(&self.ollama_bin);
        cmd.arg("create")
            .arg(name)
            .arg("-f")
            .arg(manifest)
            .env("OLLAMA_HOST", self.host());
        run_tool(cmd, "ollama create", CREATE_TIMEOUT)
            .await
            .map_err(command_error)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.url("/api/version"))
            .timeout(QUICK_TIMEOUT)
            .send()
            .await
            .map_err(|e| unreachable(&e))?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::{delete, get, post};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_list_installed() {
        let base = serve(Router::new().route(
            "/api/tags",
            get(|| async {
                Json(json!({"models": [{"name": "llama3:latest"}, {"name": "phi3:mini"}]}))
            }),
        ))
        .await;
        let backend = OllamaBackend::new(&base, "ollama").unwrap();
        assert_eq!(
            backend.list_installed().await.unwrap(),
            vec!["llama3:latest", "phi3:mini"]
        );
    }

    #[tokio::test]
    async fn test_pull_sends_non_streaming_request() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let captured = seen.clone();
        let base = serve(Router::new().route(
            "/api/pull",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({"status": "success"}))
                }
            }),
        ))
        .await;

        let backend = OllamaBackend::new(&base, "ollama").unwrap();
        backend.pull("llama3").await.unwrap();
        assert_eq!(
            seen.lock().unwrap().clone().unwrap(),
            json!({"name": "llama3", "stream": false})
        );
    }

    #[tokio::test]
    async fn test_rejection_carries_status_and_body() {
        let base = serve(Router::new().route(
            "/api/delete",
            delete(|| async { (StatusCode::NOT_FOUND, "model not found") }),
        ))
        .await;
        let backend = OllamaBackend::new(&base, "ollama").unwrap();
        let err = backend.delete("ghost").await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 404,
                message: "model not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        // Bind then drop to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = OllamaBackend::new(&format!("http://{addr}"), "ollama").unwrap();
        assert!(matches!(
            backend.ping().await,
            Err(BackendError::Unreachable(_))
        ));
    }

    #[test]
    fn test_host_strips_scheme() {
        let backend = OllamaBackend::new("http://127.0.0.1:11435/", "ollama").unwrap();
        assert_eq!(backend.host(), "127.0.0.1:11435");
    }

    #[tokio::test]
    async fn test_import_with_missing_cli() {
        let backend = OllamaBackend::new("http://127.0.0.1:1", "no-such-ollama-ohhhllama").unwrap();
        let err = backend
            .import("m", Path::new("/tmp/m.Modelfile"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Command(_)));
    }
}
