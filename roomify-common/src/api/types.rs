//! Shared API request/response types
//!
//! Types used by the worker handlers and by the client action layer.

use serde::{Deserialize, Serialize};

use crate::project::{Project, Visibility};

// ========================================
// Project Types
// ========================================

/// Body of `POST /api/projects/save`
///
/// # Examples
///
/// ```
/// use roomify_common::api::types::SaveProjectRequest;
/// use roomify_common::{Project, Visibility};
///
/// let request = SaveProjectRequest {
///     project: Project::new("p1", "data:image/png;base64,AAAA"),
///     visibility: Visibility::Private,
/// };
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["visibility"], "private");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProjectRequest {
    pub project: Project,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Response of a successful save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProjectResponse {
    pub saved: bool,
    pub id: String,
    pub project: Project,
}

/// Response of `GET /api/projects/get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProjectResponse {
    pub project: Project,
}

/// Response of `GET /api/projects/list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<Project>,
}

// ========================================
// Session Types
// ========================================

/// Signed-in user as reported by the auth provider's `whoami` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uuid: String,
    #[serde(default)]
    pub username: Option<String>,
}

// ========================================
// Error Response Types
// ========================================

/// JSON error body returned by every failing worker request
///
/// # Examples
///
/// ```
/// use roomify_common::api::types::ErrorResponse;
///
/// let error = ErrorResponse::new("Project not found");
/// assert_eq!(
///     serde_json::to_string(&error).unwrap(),
///     r#"{"error":"Project not found"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short error summary
    pub error: String,
    /// Underlying failure detail (internal errors only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

// ========================================
// Tests
// ========================================
