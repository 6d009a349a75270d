//! Client-side session handling
//!
//! The hosted auth provider is reached through [`AuthProvider`]. The default
//! implementation, [`TokenAuth`], holds a bearer token and asks the provider's
//! `whoami` endpoint who it belongs to.

use async_trait::async_trait;
use roomify_common::api::UserInfo;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Establish a session and return the signed-in user
    async fn sign_in(&self) -> ClientResult<UserInfo>;

    /// Drop the session; later requests go out unauthenticated
    async fn sign_out(&self);

    /// The signed-in user, `Ok(None)` when there is no session
    async fn current_user(&self) -> ClientResult<Option<UserInfo>>;

    /// Token to present to the worker
    async fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    user: Option<UserInfo>,
}

/// Bearer-token session verified against `<auth_url>/whoami`
pub struct TokenAuth {
    http_client: reqwest::Client,
    auth_url: Option<String>,
    session: RwLock<Session>,
}

impl TokenAuth {
    pub fn new(auth_url: Option<String>, token: Option<String>) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            auth_url: auth_url.map(|url| url.trim_end_matches('/').to_string()),
            session: RwLock::new(Session { token, user: None }),
        })
    }

    async fn whoami(&self, token: &str) -> ClientResult<UserInfo> {
        let auth_url = self
            .auth_url
            .as_deref()
            .ok_or(ClientError::NotConfigured("auth_url"))?;

        let response = self
            .http_client
            .get(format!("{}/whoami", auth_url))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<UserInfo>().await?)
    }
}

#[async_trait]
impl AuthProvider for TokenAuth {
    async fn sign_in(&self) -> ClientResult<UserInfo> {
        let token = self
            .session
            .read()
            .await
            .token
            .clone()
            .ok_or(ClientError::NotSignedIn)?;

        let user = self.whoami(&token).await?;
        info!(user = %user.uuid, "Signed in");
        self.session.write().await.user = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) {
        let mut session = self.session.write().await;
        session.token = None;
        session.user = None;
        info!("Signed out");
    }

    async fn current_user(&self) -> ClientResult<Option<UserInfo>> {
        let (token, cached) = {
            let session = self.session.read().await;
            (session.token.clone(), session.user.clone())
        };

        if cached.is_some() {
            return Ok(cached);
        }
        let Some(token) = token else {
            return Ok(None);
        };
        if self.auth_url.is_none() {
            debug!("No auth provider configured; user unknown");
            return Ok(None);
        }

        let user = self.whoami(&token).await?;
        self.session.write().await.user = Some(user.clone());
        Ok(Some(user))
    }

    async fn bearer_token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_without_token_is_not_signed_in() {
        let auth = TokenAuth::new(Some("http://127.0.0.1:9".into()), None).unwrap();
        assert!(matches!(auth.sign_in().await, Err(ClientError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_sign_in_without_provider_is_not_configured() {
        let auth = TokenAuth::new(None, Some("tok".into())).unwrap();
        assert!(matches!(
            auth.sign_in().await,
            Err(ClientError::NotConfigured("auth_url"))
        ));
    }

    #[tokio::test]
    async fn test_current_user_without_provider_is_none() {
        let auth = TokenAuth::new(None, Some("tok".into())).unwrap();
        assert!(auth.current_user().await.unwrap().is_none());
        assert_eq!(auth.bearer_token().await.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let auth = TokenAuth::new(None, Some("tok".into())).unwrap();
        auth.sign_out().await;
        assert!(auth.bearer_token().await.is_none());
        assert!(auth.current_user().await.unwrap().is_none());
    }
}
