//! HTTP surface for the ohhhllama acquisition queue.
//!
//! Intake (`POST /api/pull`, `POST /api/queue`), status and removal
//! (`GET`/`DELETE /api/queue`) and a tri-state health summary
//! (`GET /api/health`). Everything else a client sends belongs to the
//! inference backend and is not served here.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{CorsConfig, ServerConfig, ServerContext, start_server};
pub use error::HttpError;
pub use intake::{IntakeError, IntakeOutcome, IntakeService};
pub use routes::create_router;
pub use state::AppState;
