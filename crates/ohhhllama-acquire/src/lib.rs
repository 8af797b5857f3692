//! Acquisition pipeline for the ohhhllama queue.
//!
//! This crate turns a claimed [`Job`](ohhhllama_core::Job) into bytes the
//! inference server can use:
//!
//! - [`resolver`]: direct artifact, convertible source, or unsupported
//! - [`fetch`]: ordered download strategies
//! - [`convert`]: llama.cpp conversion and quantization
//! - [`import`]: manifest generation and backend import
//! - [`backend`]: inference and container backend adapters
//! - [`pipeline`]: per-kind dispatch of the steps above
//! - [`processor`]: the queue-draining loop with retry and disk gating

#![deny(unsafe_code)]

pub mod backend;
pub mod convert;
pub mod disk;
pub mod fetch;
pub mod import;
pub mod pipeline;
pub mod process;
pub mod processor;
pub mod resolver;

pub use backend::{DockerBackend, OllamaBackend};
pub use convert::LlamaCppConverter;
pub use disk::SysinfoDiskProbe;
pub use fetch::{FetchError, Fetcher, HfCliStrategy, HttpStreamStrategy, WgetStrategy};
pub use import::{ImportError, Importer, ManifestDefaults, Modelfile};
pub use pipeline::{AcquisitionPipeline, PipelineDirs};
pub use process::ToolError;
pub use processor::{JobExecutor, ProcessorError, ProcessorSettings, QueueProcessor, RunSummary};
pub use resolver::{Resolver, select_artifact};

#[cfg(test)]
use tokio_test as _;
