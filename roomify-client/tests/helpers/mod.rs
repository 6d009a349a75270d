//! Shared helpers for roomify-client integration tests
//!
//! Every server binds 127.0.0.1:0 and is torn down with the test runtime.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get, put};
use axum::{Json, Router};
use roomify_client::auth::TokenAuth;
use roomify_client::hosting::{HttpImageHost, ImageHost};
use roomify_client::ProjectActions;
use roomify_common::config::SessionEntry;
use roomify_worker::api::StaticSessions;
use roomify_worker::store::MemoryStore;
use roomify_worker::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TOKEN: &str = "token-alice";
pub const USER_ID: &str = "alice";

/// Serve `app` on an ephemeral port, returning its base URL
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Real worker over an in-memory store with one static session
pub async fn spawn_worker() -> String {
    let sessions = StaticSessions::new(&[SessionEntry {
        token: TOKEN.to_string(),
        user_id: USER_ID.to_string(),
        username: Some("alice".to_string()),
    }]);
    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(sessions));
    spawn(build_router(state)).await
}

/// Hosting stand-in: `PUT /projects/:id/:label` -> `{url}`
pub async fn spawn_hosting() -> String {
    async fn upload(Path((id, label)): Path<(String, String)>) -> Json<Value> {
        Json(json!({ "url": format!("https://cdn.example/{}/{}.png", id, label) }))
    }

    spawn(Router::new().route("/projects/:id/:label", put(upload))).await
}

/// Hosting stand-in that always fails
pub async fn spawn_broken_hosting() -> String {
    spawn(Router::new().route(
        "/projects/:id/:label",
        put(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await
}

/// Worker stand-in that counts requests and gives every one the same answer
pub async fn spawn_fake_worker(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));

    async fn reply(
        State((calls, status, content_type, body)): State<(
            Arc<AtomicUsize>,
            StatusCode,
            &'static str,
            &'static str,
        )>,
    ) -> impl IntoResponse {
        calls.fetch_add(1, Ordering::SeqCst);
        (status, [(header::CONTENT_TYPE, content_type)], body)
    }

    let app = Router::new()
        .route("/*path", any(reply))
        .with_state((calls.clone(), status, content_type, body));
    (spawn(app).await, calls)
}

/// Auth provider stand-in: `GET /whoami` accepts only [`TOKEN`]
pub async fn spawn_auth() -> String {
    async fn whoami(headers: axum::http::HeaderMap) -> impl IntoResponse {
        let expected = format!("Bearer {}", TOKEN);
        match headers.get(header::AUTHORIZATION) {
            Some(value) if value == expected.as_str() => (
                StatusCode::OK,
                Json(json!({"uuid": USER_ID, "username": "alice"})),
            ),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Authentication failed"})),
            ),
        }
    }

    spawn(Router::new().route("/whoami", get(whoami))).await
}

pub fn actions(worker_url: Option<String>, hosting_url: Option<&str>) -> ProjectActions {
    let auth = TokenAuth::new(None, Some(TOKEN.to_string())).unwrap();
    let hosting = hosting_url
        .map(|url| Arc::new(HttpImageHost::new(url).unwrap()) as Arc<dyn ImageHost>);
    ProjectActions::new(worker_url, Arc::new(auth), hosting)
}
