//! # Roomify Client
//!
//! Client side of the Roomify project flow:
//! - Action layer over the worker API and image hosting (`actions`)
//! - Floor-plan upload session (`upload`)
//! - Visualizer reconciliation and render generation (`visualizer`)
//! - Export of the shown render (`export`)

pub mod actions;
pub mod auth;
pub mod data_url;
pub mod error;
pub mod export;
pub mod hosting;
pub mod render;
pub mod upload;
pub mod visualizer;

pub use actions::{ProjectActions, ProjectApi};
pub use auth::{AuthProvider, TokenAuth};
pub use error::{ClientError, ClientResult};
pub use hosting::{HttpImageHost, ImageHost};
pub use render::{HttpRenderGenerator, RenderGenerator, RenderOutput};
pub use upload::{UploadConfig, UploadError, UploadFile, UploadSession, UploadState};
pub use visualizer::{
    resolve_project_source, ExportDownload, ProjectSource, ReconcileAction, Visualizer,
    VisualizerPhase,
};
