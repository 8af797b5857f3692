//! Acquisition pipeline types shared between the resolver, the pipeline and
//! the queue processor.

mod errors;
mod plan;

pub use errors::{AcquireError, Stage};
pub use plan::{Plan, SourceLocator, UnsupportedReason};
