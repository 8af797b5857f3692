//! The `ohhhllama` command line.
//!
//! `serve` runs the intake server, `process` is the scheduled activation
//! that drains the queue, and the remaining commands inspect and administer
//! the queue directly.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary.
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod config_args;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::{Commands, EnqueueTarget};
pub use config_args::ConfigArgs;
pub use error::CliError;
pub use parser::Cli;
