//! Project record model and key-value layout
//!
//! A project pairs a source floor-plan image with its rendered counterpart
//! plus ownership and visibility metadata. One record is stored per project
//! under `roomify_project_<id>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Key prefix for every persisted project record
pub const PROJECT_KEY_PREFIX: &str = "roomify_project_";

/// Build the key-value store key for a project id
pub fn project_key(id: &str) -> String {
    format!("{}{}", PROJECT_KEY_PREFIX, id)
}

/// True when a store key belongs to a project record
pub fn is_project_key(key: &str) -> bool {
    key.starts_with(PROJECT_KEY_PREFIX)
}

/// Project visibility
///
/// Anything other than `"public"` (including a missing value) is private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    /// Lenient parse: only the exact string `public` is public
    pub fn parse_lossy(value: &str) -> Self {
        if value == "public" {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(Visibility::parse_lossy)
            .unwrap_or_default())
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Inline data URL or hosted URL
    pub source_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_image: Option<String>,

    #[serde(default)]
    pub visibility: Visibility,

    /// Always equal to `visibility == public` once saved
    #[serde(default)]
    pub is_public: bool,

    /// Creation time, Unix epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Client fields the worker does not interpret, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn new(id: impl Into<String>, source_image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: None,
            name: None,
            source_image: source_image.into(),
            rendered_image: None,
            visibility: Visibility::Private,
            is_public: false,
            timestamp: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn storage_key(&self) -> String {
        project_key(&self.id)
    }

    pub fn has_render(&self) -> bool {
        self.rendered_image
            .as_deref()
            .is_some_and(|image| !image.is_empty())
    }

    /// Set visibility and the derived `is_public` flag together
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
        self.is_public = visibility.is_public();
    }
}

/// Client-side project draft
///
/// Everything is optional here; the action layer resolves hosted image URLs
/// and drops the local-only path fields before anything reaches the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source_image: Option<String>,
    #[serde(default)]
    pub rendered_image: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,

    // Local-only paths, never persisted
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub rendered_path: Option<String>,
    #[serde(default)]
    pub public_path: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Project> for ProjectDraft {
    fn from(project: Project) -> Self {
        Self {
            id: Some(project.id),
            owner_id: project.owner_id,
            name: project.name,
            source_image: Some(project.source_image),
            rendered_image: project.rendered_image,
            timestamp: project.timestamp,
            source_path: None,
            rendered_path: None,
            public_path: None,
            extra: project.extra,
        }
    }
}
