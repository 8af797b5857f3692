//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use ohhhllama_axum::{CorsConfig, ServerContext, create_router};
use ohhhllama_core::{AppConfig, BackendError, DiskError, DiskProbe, InferenceBackend};
use ohhhllama_db::TestDb;
use tower::ServiceExt;

pub const CLIENT_IP: &str = "198.51.100.7";

pub struct StubBackend {
    pub installed: Vec<String>,
    pub reachable: bool,
}

impl StubBackend {
    pub fn empty() -> Self {
        Self {
            installed: Vec::new(),
            reachable: true,
        }
    }

    pub fn down() -> Self {
        Self {
            installed: Vec::new(),
            reachable: false,
        }
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.reachable {
            Ok(())
        } else {
            Err(BackendError::Unreachable("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn list_installed(&self) -> Result<Vec<String>, BackendError> {
        self.check()?;
        Ok(self.installed.clone())
    }

    async fn pull(&self, _name: &str) -> Result<(), BackendError> {
        self.check()
    }

    async fn delete(&self, _name: &str) -> Result<(), BackendError> {
        self.check()
    }

    async fn import(&self, _name: &str, _manifest: &Path) -> Result<(), BackendError> {
        self.check()
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.check()
    }
}

pub struct StubDisk(pub f64);

impl DiskProbe for StubDisk {
    fn usage_percent(&self, _path: &Path) -> Result<f64, DiskError> {
        Ok(self.0)
    }
}

pub struct TestApp {
    pub db: TestDb,
    pub router: Router,
}

pub async fn app(rate_limit: u32, backend: StubBackend, disk_usage: f64) -> TestApp {
    let db = TestDb::new().await.unwrap();
    let config = AppConfig {
        rate_limit,
        ..AppConfig::default()
    };
    let ctx = ServerContext::new(
        db.stores(rate_limit),
        Arc::new(backend) as Arc<dyn InferenceBackend>,
        Arc::new(StubDisk(disk_usage)),
        &config,
    );
    let router = create_router(ctx, &CorsConfig::AllowAll);
    TestApp { db, router }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", CLIENT_IP);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn json(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> (u16, serde_json::Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
