//! Error types for roomify-worker
//!
//! Every handler failure is converted into a JSON [`ErrorResponse`] at the
//! handler boundary; nothing propagates to the client as a raw error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roomify_common::api::ErrorResponse;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No resolved user (401)
    #[error("Authentication failed")]
    Unauthorized,

    /// Missing or malformed required field (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unknown project (404)
    #[error("{0}")]
    NotFound(String),

    /// Store or upstream failure (500)
    #[error("{context}: {message}")]
    Internal {
        context: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn internal(context: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            context,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unauthorized => ErrorResponse::new("Authentication failed"),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => ErrorResponse::new(msg),
            ApiError::Internal { context, message } => {
                ErrorResponse::with_message(context, message)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience Result type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
