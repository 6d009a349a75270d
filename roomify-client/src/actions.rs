//! Client action layer
//!
//! Typed wrappers over the worker API and the hosting service. Every public
//! operation fails closed: problems are logged and reported as `None` (or an
//! empty list), never as an error the page layer has to handle.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use roomify_common::api::{
    ErrorResponse, GetProjectResponse, ListProjectsResponse, SaveProjectRequest,
    SaveProjectResponse, UserInfo,
};
use roomify_common::config::ClientSettings;
use roomify_common::project::ProjectDraft;
use roomify_common::{Project, Visibility};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthProvider, TokenAuth};
use crate::error::{ClientError, ClientResult};
use crate::hosting::{is_hosted_url, HttpImageHost, ImageHost, RENDERED_LABEL, SOURCE_LABEL};

const SAVE_PATH: &str = "/api/projects/save";
const GET_PATH: &str = "/api/projects/get";
const LIST_PATH: &str = "/api/projects/list";

/// Characters of a non-JSON body kept for the log line
const SNIPPET_CHARS: usize = 100;

pub struct ProjectActions {
    http_client: reqwest::Client,
    worker_url: Option<String>,
    auth: Arc<dyn AuthProvider>,
    hosting: Option<Arc<dyn ImageHost>>,
}

impl ProjectActions {
    pub fn new(
        worker_url: Option<String>,
        auth: Arc<dyn AuthProvider>,
        hosting: Option<Arc<dyn ImageHost>>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            worker_url: worker_url.map(|url| url.trim_end_matches('/').to_string()),
            auth,
            hosting,
        }
    }

    /// Wire up token auth and HTTP hosting from resolved settings
    pub fn from_settings(settings: &ClientSettings) -> ClientResult<Self> {
        let auth = TokenAuth::new(settings.auth_url.clone(), settings.auth_token.clone())?;
        let hosting = match &settings.hosting_url {
            Some(url) => Some(Arc::new(HttpImageHost::new(url)?) as Arc<dyn ImageHost>),
            None => None,
        };

        Ok(Self::new(settings.worker_url.clone(), Arc::new(auth), hosting))
    }

    // ========================================
    // Session
    // ========================================

    pub async fn sign_in(&self) -> ClientResult<UserInfo> {
        self.auth.sign_in().await
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out().await
    }

    pub async fn current_user(&self) -> Option<UserInfo> {
        match self.auth.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Could not resolve current user: {}", e);
                None
            }
        }
    }

    // ========================================
    // Projects
    // ========================================

    /// Persist a project draft
    ///
    /// Images are moved to hosting first when the draft has an id. A draft
    /// without any source image is never sent to the worker. Inline renders
    /// that could not be hosted are dropped rather than persisted.
    pub async fn create_project(
        &self,
        item: &ProjectDraft,
        visibility: Visibility,
    ) -> Option<Project> {
        let project_id = item.id.as_deref().filter(|id| !id.is_empty());
        let source = item.source_image.as_deref().filter(|s| !s.is_empty());
        let render = item.rendered_image.as_deref().filter(|r| !r.is_empty());

        let hosted_source = match (project_id, source) {
            (Some(id), Some(source)) => self.upload_image(id, SOURCE_LABEL, source).await,
            _ => None,
        };
        let hosted_render = match (project_id, render) {
            (Some(id), Some(render)) => self.upload_image(id, RENDERED_LABEL, render).await,
            _ => None,
        };

        let resolved_source = hosted_source.or_else(|| source.map(str::to_string));
        let Some(source_image) = resolved_source else {
            warn!("No source image available, skipping save");
            return None;
        };

        let Some(id) = project_id else {
            warn!("Project has no id, skipping save");
            return None;
        };

        let rendered_image =
            hosted_render.or_else(|| render.filter(|r| is_hosted_url(r)).map(str::to_string));

        // Local-only path fields live outside `extra` and are dropped here
        let mut project = Project::new(id, source_image);
        project.owner_id = item.owner_id.clone();
        project.name = item.name.clone();
        project.rendered_image = rendered_image;
        project.timestamp = item.timestamp;
        project.extra = item.extra.clone();
        project.set_visibility(visibility);

        let Some(worker_url) = self.worker_url.as_deref() else {
            error!("Worker URL is missing. Set ROOMIFY_WORKER_URL or worker_url in roomify.toml");
            return None;
        };

        match self
            .save(worker_url, &SaveProjectRequest { project, visibility })
            .await
        {
            Ok(saved) => {
                info!(project_id = %saved.id, "Project saved");
                Some(saved)
            }
            Err(e) => {
                error!(project_id = %id, "Failed to save project: {}", e);
                None
            }
        }
    }

    /// Fetch one project, `None` when absent or on any failure
    pub async fn get_project(&self, id: &str) -> Option<Project> {
        let Some(worker_url) = self.worker_url.as_deref() else {
            error!("Worker URL is missing; cannot fetch project {}", id);
            return None;
        };

        match self.fetch(worker_url, id).await {
            Ok(project) => project,
            Err(e) => {
                warn!(project_id = %id, "Failed to fetch project: {}", e);
                None
            }
        }
    }

    pub async fn get_project_by_id(&self, id: &str) -> Option<Project> {
        self.get_project(id).await
    }

    /// All projects of the signed-in user, in worker order
    pub async fn list_projects(&self) -> Vec<Project> {
        let Some(worker_url) = self.worker_url.as_deref() else {
            error!("Worker URL is missing; cannot list projects");
            return Vec::new();
        };

        match self.list(worker_url).await {
            Ok(projects) => projects,
            Err(e) => {
                warn!("Failed to list projects: {}", e);
                Vec::new()
            }
        }
    }

    // ========================================
    // HTTP plumbing
    // ========================================

    async fn upload_image(&self, project_id: &str, label: &str, image: &str) -> Option<String> {
        let hosting = self.hosting.as_ref()?;
        match hosting.upload(project_id, label, image).await {
            Ok(hosted) => Some(hosted.url),
            Err(e) => {
                warn!(project_id, label, "Image hosting failed: {}", e);
                None
            }
        }
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth.bearer_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn save(&self, worker_url: &str, body: &SaveProjectRequest) -> ClientResult<Project> {
        let request = self
            .http_client
            .post(format!("{}{}", worker_url, SAVE_PATH))
            .json(body);
        let response = self.authorized(request).await.send().await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if !is_json {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::NotJson {
                status: status.as_u16(),
                snippet: text.chars().take(SNIPPET_CHARS).collect(),
            });
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| match body.message {
                    Some(detail) => format!("{} ({})", body.error, detail),
                    None => body.error,
                })
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let saved: SaveProjectResponse = response.json().await?;
        Ok(saved.project)
    }

    async fn fetch(&self, worker_url: &str, id: &str) -> ClientResult<Option<Project>> {
        let request = self
            .http_client
            .get(format!("{}{}", worker_url, GET_PATH))
            .query(&[("id", id)]);
        let response = self.authorized(request).await.send().await?;

        if !response.status().is_success() {
            debug!(project_id = %id, status = %response.status(), "Project not available");
            return Ok(None);
        }

        let body: GetProjectResponse = response.json().await?;
        Ok(Some(body.project))
    }

    async fn list(&self, worker_url: &str) -> ClientResult<Vec<Project>> {
        let request = self.http_client.get(format!("{}{}", worker_url, LIST_PATH));
        let response = self.authorized(request).await.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: ListProjectsResponse = response.json().await?;
        Ok(body.projects)
    }
}

/// Project operations the visualizer depends on
#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn fetch_project(&self, id: &str) -> Option<Project>;

    async fn persist_project(&self, draft: &ProjectDraft, visibility: Visibility)
        -> Option<Project>;

    async fn signed_in_user(&self) -> Option<UserInfo>;
}

#[async_trait]
impl ProjectApi for ProjectActions {
    async fn fetch_project(&self, id: &str) -> Option<Project> {
        self.get_project_by_id(id).await
    }

    async fn persist_project(
        &self,
        draft: &ProjectDraft,
        visibility: Visibility,
    ) -> Option<Project> {
        self.create_project(draft, visibility).await
    }

    async fn signed_in_user(&self) -> Option<UserInfo> {
        self.current_user().await
    }
}
