//! Error types for roomify-client
//!
//! The public action layer converts these into `None`/empty results after
//! logging; they surface directly only from the lower-level clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Non-JSON response ({status}): {snippet}")]
    NotJson { status: u16, snippet: String },

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid image reference: {0}")]
    InvalidImage(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
