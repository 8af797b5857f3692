//! Domain types for the acquisition queue.
//!
//! Pure data types with no I/O dependencies.

mod job;
mod quant;
mod subject;

pub use job::{Job, JobId, JobKind, JobStatus, StatusCounts};
pub use quant::{Quantization, UnknownQuantization};
pub use subject::{RepoDescriptor, Subject};
