//! # Roomify Common Library
//!
//! Shared code for the Roomify worker and client including:
//! - Project record model and key layout
//! - API request/response types
//! - Configuration loading
//! - Timestamp helpers

pub mod api;
pub mod config;
pub mod error;
pub mod project;
pub mod time;

pub use error::{Error, Result};
pub use project::{Project, Visibility, PROJECT_KEY_PREFIX};
