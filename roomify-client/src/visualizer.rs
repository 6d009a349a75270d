//! Visualizer reconciliation
//!
//! Holds the project being viewed, decides whether a render must be
//! generated, and persists generated renders back through [`ProjectApi`].
//!
//! **Precedence:** a project fetched from the worker always wins over the
//! navigation state handed in by the upload flow; navigation state is only a
//! fallback for when the fetch returns nothing.
//!
//! **One-shot generation:** `has_generated_for_project_id` records the project
//! a generation was started for. Reconciling the same project again never
//! issues a second generator call, whatever its outcome was.
//! Loading a different project clears it.

use roomify_common::project::ProjectDraft;
use roomify_common::time::now_millis;
use roomify_common::{Project, Visibility};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::actions::ProjectApi;
use crate::render::RenderGenerator;

/// Where the current project came from
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectSource {
    Unloaded,
    FromNavigation(Project),
    FromStore(Project),
}

impl ProjectSource {
    pub fn project(&self) -> Option<&Project> {
        match self {
            ProjectSource::Unloaded => None,
            ProjectSource::FromNavigation(project) | ProjectSource::FromStore(project) => {
                Some(project)
            }
        }
    }
}

/// Pick the project to show for `id`
///
/// Navigation state is ignored when it describes a different project.
pub fn resolve_project_source(
    id: &str,
    fetched: Option<Project>,
    navigation: Option<Project>,
) -> ProjectSource {
    if let Some(project) = fetched {
        return ProjectSource::FromStore(project);
    }
    match navigation {
        Some(project) if project.id == id => ProjectSource::FromNavigation(project),
        _ => ProjectSource::Unloaded,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerPhase {
    Empty,
    Loading,
    Idle,
    Generating,
    GenerationFailed,
}

/// What `reconcile` will do for the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    None,
    ShowRender(String),
    Generate { project_id: String, source_image: String },
}

/// Download produced by the export button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDownload {
    pub file_name: String,
    pub image: String,
}

pub struct Visualizer {
    api: Arc<dyn ProjectApi>,
    generator: Arc<dyn RenderGenerator>,
    phase: VisualizerPhase,
    source: ProjectSource,
    current_image: Option<String>,
    has_generated_for_project_id: Option<String>,
}

impl Visualizer {
    pub fn new(api: Arc<dyn ProjectApi>, generator: Arc<dyn RenderGenerator>) -> Self {
        Self {
            api,
            generator,
            phase: VisualizerPhase::Empty,
            source: ProjectSource::Unloaded,
            current_image: None,
            has_generated_for_project_id: None,
        }
    }

    pub fn phase(&self) -> VisualizerPhase {
        self.phase
    }

    pub fn source(&self) -> &ProjectSource {
        &self.source
    }

    pub fn project(&self) -> Option<&Project> {
        self.source.project()
    }

    pub fn current_image(&self) -> Option<&str> {
        self.current_image.as_deref()
    }

    pub fn is_project_loading(&self) -> bool {
        self.phase == VisualizerPhase::Loading
    }

    pub fn is_processing(&self) -> bool {
        self.phase == VisualizerPhase::Generating
    }

    /// Load project `id`, falling back to `navigation` if the fetch is empty
    pub async fn load(&mut self, id: &str, navigation: Option<Project>) {
        self.phase = VisualizerPhase::Loading;
        let fetched = self.api.fetch_project(id).await;
        let resolved = resolve_project_source(id, fetched, navigation);

        let keeps_prior = matches!(resolved, ProjectSource::Unloaded)
            && self.project().is_some_and(|prior| prior.id == id);

        if keeps_prior {
            debug!(project_id = %id, "Nothing new to load, keeping current project");
        } else {
            if self.project().map(|p| p.id.as_str()) != Some(id) {
                self.current_image = None;
                self.has_generated_for_project_id = None;
            }
            self.source = resolved;
        }

        self.phase = if self.source.project().is_some() {
            VisualizerPhase::Idle
        } else {
            warn!(project_id = %id, "Project not found");
            VisualizerPhase::Empty
        };
    }

    /// Decide the next step without side effects
    pub fn plan(&self) -> ReconcileAction {
        if matches!(
            self.phase,
            VisualizerPhase::Loading | VisualizerPhase::Generating
        ) {
            return ReconcileAction::None;
        }
        let Some(project) = self.project() else {
            return ReconcileAction::None;
        };

        if let Some(render) = project.rendered_image.as_deref().filter(|r| !r.is_empty()) {
            return ReconcileAction::ShowRender(render.to_string());
        }
        if self.has_generated_for_project_id.as_deref() == Some(project.id.as_str()) {
            return ReconcileAction::None;
        }
        if project.source_image.is_empty() {
            return ReconcileAction::None;
        }

        ReconcileAction::Generate {
            project_id: project.id.clone(),
            source_image: project.source_image.clone(),
        }
    }

    /// Bring the view in line with the loaded project
    pub async fn reconcile(&mut self) -> ReconcileAction {
        let action = self.plan();
        match &action {
            ReconcileAction::None => {}
            ReconcileAction::ShowRender(render) => {
                self.current_image = Some(render.clone());
                self.phase = VisualizerPhase::Idle;
            }
            ReconcileAction::Generate {
                project_id,
                source_image,
            } => {
                self.has_generated_for_project_id = Some(project_id.clone());
                self.run_generation(project_id, source_image).await;
            }
        }
        action
    }

    async fn run_generation(&mut self, project_id: &str, source_image: &str) {
        self.phase = VisualizerPhase::Generating;
        info!(project_id, "Generating render");

        let rendered = match self.generator.generate(source_image).await {
            Ok(output) => output.rendered_image.filter(|image| !image.is_empty()),
            Err(e) => {
                error!(project_id, "Render generation failed: {}", e);
                self.phase = VisualizerPhase::GenerationFailed;
                return;
            }
        };
        let Some(rendered) = rendered else {
            warn!(project_id, "Generator returned no image");
            self.phase = VisualizerPhase::GenerationFailed;
            return;
        };

        self.current_image = Some(rendered.clone());

        let Some(project) = self.project().cloned() else {
            self.phase = VisualizerPhase::Idle;
            return;
        };
        let mut draft = ProjectDraft::from(project);
        draft.rendered_image = Some(rendered);
        if draft.owner_id.is_none() {
            draft.owner_id = self.api.signed_in_user().await.map(|user| user.uuid);
        }
        if draft.timestamp.is_none() {
            draft.timestamp = Some(now_millis());
        }

        match self.api.persist_project(&draft, Visibility::Private).await {
            Some(saved) => {
                if let Some(render) = saved.rendered_image.clone().filter(|r| !r.is_empty()) {
                    self.current_image = Some(render);
                }
                info!(project_id, "Render saved");
                self.source = ProjectSource::FromStore(saved);
            }
            None => warn!(project_id, "Render was not saved; keeping local image"),
        }
        self.phase = VisualizerPhase::Idle;
    }

    /// Download for the shown image, `None` until there is one
    pub fn export(&self) -> Option<ExportDownload> {
        let image = self.current_image.clone()?;
        let id = self.project().map(|p| p.id.as_str()).unwrap_or("design");
        Some(ExportDownload {
            file_name: format!("roomify-{}.png", sanitize_file_stem(id)),
            image,
        })
    }
}

fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
