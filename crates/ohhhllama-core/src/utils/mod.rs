//! Small shared helpers.

pub mod sanitize;

pub use sanitize::{archive_name_for_image, default_name_for_repo, sanitize_model_name};
