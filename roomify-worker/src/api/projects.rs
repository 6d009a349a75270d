//! Project handlers: save, get, list
//!
//! Each handler runs after [`auth_middleware`](super::auth_middleware) has
//! resolved the user, so store access always happens inside that user's
//! namespace.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};
use roomify_common::api::{GetProjectResponse, ListProjectsResponse, SaveProjectResponse};
use roomify_common::project::{is_project_key, project_key};
use roomify_common::{Project, Visibility};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const SAVE_FAILED: &str = "Failed to save project";
const GET_FAILED: &str = "Failed to get project";
const LIST_FAILED: &str = "Failed to list projects";

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Build the persisted record from a raw save body
///
/// Requires `project.id` and `project.sourceImage`. Stamps visibility, the
/// derived `isPublic` flag, `updatedAt`, and the owner when missing.
pub fn build_saved_project(body: &Value, user: &AuthUser) -> ApiResult<Project> {
    let project_value = body.get("project").cloned().unwrap_or(Value::Null);

    if non_empty_str(&project_value, "id").is_none()
        || non_empty_str(&project_value, "sourceImage").is_none()
    {
        return Err(ApiError::BadRequest(
            "Project id and source image are required".to_string(),
        ));
    }

    let visibility = body
        .get("visibility")
        .and_then(Value::as_str)
        .map(Visibility::parse_lossy)
        .unwrap_or_default();

    let mut project: Project = serde_json::from_value(project_value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid project: {}", e)))?;

    project.set_visibility(visibility);
    project.updated_at = Some(roomify_common::time::now());
    if project.owner_id.as_deref().map_or(true, str::is_empty) {
        project.owner_id = Some(user.user_id.clone());
    }

    Ok(project)
}

/// POST /api/projects/save
pub async fn save_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<Json<SaveProjectResponse>> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let project = build_saved_project(&body, &user)?;
    let value = serde_json::to_value(&project).map_err(|e| ApiError::internal(SAVE_FAILED, e))?;

    state
        .store
        .set(&user.user_id, &project.storage_key(), value)
        .await
        .map_err(|e| {
            error!(project_id = %project.id, "Store write failed: {}", e);
            ApiError::internal(SAVE_FAILED, e)
        })?;

    info!(
        project_id = %project.id,
        user_id = %user.user_id,
        visibility = %project.visibility,
        "Project saved"
    );

    Ok(Json(SaveProjectResponse {
        saved: true,
        id: project.id.clone(),
        project,
    }))
}

/// Query parameters for GET /api/projects/get
#[derive(Debug, Deserialize)]
pub struct GetProjectQuery {
    pub id: Option<String>,
}

/// GET /api/projects/get?id=<id>
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GetProjectQuery>,
) -> ApiResult<Json<GetProjectResponse>> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Project ID is required".to_string()))?;

    let value = state
        .store
        .get(&user.user_id, &project_key(&id))
        .await
        .map_err(|e| {
            error!(project_id = %id, "Store read failed: {}", e);
            ApiError::internal(GET_FAILED, e)
        })?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let project: Project =
        serde_json::from_value(value).map_err(|e| ApiError::internal(GET_FAILED, e))?;

    debug!(project_id = %id, "Project fetched");
    Ok(Json(GetProjectResponse { project }))
}

/// GET /api/projects/list
///
/// Order follows the store's key enumeration; no sorting is applied.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ListProjectsResponse>> {
    let keys = state
        .store
        .list_keys(&user.user_id)
        .await
        .map_err(|e| ApiError::internal(LIST_FAILED, e))?;

    let mut projects = Vec::new();
    for key in keys.iter().filter(|key| is_project_key(key)) {
        let value = state
            .store
            .get(&user.user_id, key)
            .await
            .map_err(|e| ApiError::internal(LIST_FAILED, e))?;

        let Some(value) = value else { continue };
        match serde_json::from_value::<Project>(value) {
            Ok(project) => projects.push(project),
            Err(e) => warn!(key = %key, "Skipping unreadable project record: {}", e),
        }
    }

    debug!(count = projects.len(), "Projects listed");
    Ok(Json(ListProjectsResponse { projects }))
}
