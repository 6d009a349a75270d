//! Liveness probe, reachable without a bearer token

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

const MODULE_NAME: &str = "roomify-worker";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: MODULE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `/health`, merged outside the auth layer
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_module_and_version() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.module, "roomify-worker");
        assert!(!body.version.is_empty());
    }
}
