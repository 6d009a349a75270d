//! Common error types for Roomify

use thiserror::Error;

/// Common result type for Roomify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping the worker or the client
#[derive(Error, Debug)]
pub enum Error {
    /// Config file exists but could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config file or setting
    #[error("Configuration error: {0}")]
    Config(String),
}
