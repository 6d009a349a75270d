//! roomify-worker library - project persistence API
//!
//! Three authenticated handlers (save, get, list) over a per-user key-value
//! store, plus a public health endpoint.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod store;

use api::SessionResolver;
use store::KvStore;

/// Largest accepted request body. Inline images travel base64-encoded.
pub const MAX_BODY_BYTES: usize = 80 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Project key-value store
    pub store: Arc<dyn KvStore>,
    /// Bearer token -> user resolution
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self { store, sessions }
    }
}

/// Build application router
///
/// The routing table is fixed here at startup. Project routes require an
/// authenticated user; `/health` does not. Every response carries
/// `Access-Control-Allow-Origin: *`.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/projects/save", post(api::save_project))
        .route("/api/projects/get", get(api::get_project))
        .route("/api/projects/list", get(api::list_projects))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
