//! Command handlers.
//!
//! Each handler returns what it did so tests can check it; printing is
//! the only side effect beyond the stores.

pub mod check;
pub mod enqueue;
pub mod process;
pub mod purge;
pub mod remove;
pub mod reset_rate;
pub mod serve;
pub mod status;

/// Origin recorded for jobs added from the command line.
pub const CLI_ORIGIN: &str = "cli";
