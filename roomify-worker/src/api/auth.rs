//! Authentication middleware for roomify-worker
//!
//! Resolves the signed-in user from the `Authorization: Bearer <token>`
//! header before any handler (and therefore any store access) runs. Requests
//! without a resolvable user are rejected with 401.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use roomify_common::api::UserInfo;
use roomify_common::config::SessionEntry;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

/// Authenticated user, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub username: Option<String>,
}

/// Maps a session token to a user
///
/// Resolution failures of any kind are reported as `None`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<AuthUser>;
}

/// Sessions configured up front (TOML `[[sessions]]`)
#[derive(Debug, Default)]
pub struct StaticSessions {
    sessions: HashMap<String, AuthUser>,
}

impl StaticSessions {
    pub fn new(entries: &[SessionEntry]) -> Self {
        let sessions = entries
            .iter()
            .map(|entry| {
                (
                    entry.token.clone(),
                    AuthUser {
                        user_id: entry.user_id.clone(),
                        username: entry.username.clone(),
                    },
                )
            })
            .collect();
        Self { sessions }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionResolver for StaticSessions {
    async fn resolve(&self, token: &str) -> Option<AuthUser> {
        self.sessions.get(token).cloned()
    }
}

/// Asks the hosted auth provider who owns a token (`GET <auth>/whoami`)
pub struct RemoteSessions {
    http_client: reqwest::Client,
    whoami_url: String,
}

impl RemoteSessions {
    pub fn new(auth_url: &str) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            whoami_url: format!("{}/whoami", auth_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SessionResolver for RemoteSessions {
    async fn resolve(&self, token: &str) -> Option<AuthUser> {
        let response = match self
            .http_client
            .get(&self.whoami_url)
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Auth provider unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "Auth provider rejected token");
            return None;
        }

        match response.json::<UserInfo>().await {
            Ok(user) if !user.uuid.is_empty() => Some(AuthUser {
                user_id: user.uuid,
                username: user.username,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("Auth provider returned unreadable user: {}", e);
                None
            }
        }
    }
}

/// Extract the bearer token from an `Authorization` header value
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Applied to the project routes only; `/health` stays public.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&request).map(str::to_owned) else {
        debug!("Request without bearer token");
        return Err(ApiError::Unauthorized);
    };

    let Some(user) = state.sessions.resolve(&token).await else {
        debug!("Bearer token did not resolve to a user");
        return Err(ApiError::Unauthorized);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
