//! HTTP API handlers for roomify-worker

pub mod auth;
pub mod health;
pub mod projects;

pub use auth::{auth_middleware, AuthUser, RemoteSessions, SessionResolver, StaticSessions};
pub use health::health_routes;
pub use projects::{get_project, list_projects, save_project};
