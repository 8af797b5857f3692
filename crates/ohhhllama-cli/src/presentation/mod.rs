//! Shared CLI presentation utilities.
//!
//! Format-only helpers for consistent terminal output.

pub mod jobs;
pub mod tables;

pub use jobs::{describe_plan, job_row, print_counts, print_job_table, print_plan, print_summary};
pub use tables::{format_optional, print_separator, truncate_string};
