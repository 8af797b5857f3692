//! `HuggingFace` metadata client.
//!
//! Implements the [`MetadataClient`](ohhhllama_core::MetadataClient) port:
//! repository file listings and the declared model architecture. Also
//! exposes the download URL layout used by the HTTP fetch strategy.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]
#![allow(private_interfaces)]

mod client;
mod config;
mod error;
mod http;
mod models;
mod port;
mod url;

pub use client::DefaultHfClient;
pub use config::HfClientConfig;
pub use error::{HfError, HfResult};
pub use url::download_url;

#[cfg(test)]
use tokio_test as _;
