//! `SQLite` storage for the ohhhllama job queue and rate limiter.
//!
//! Entry points open the database with [`setup_database`] and wire the
//! stores with [`StoreFactory`].

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

pub use factory::StoreFactory;

#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

pub use repositories::{SqliteJobStore, SqliteRateLimiter};

pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
