//! Render generator client
//!
//! Sends a source floor-plan reference to the AI rendering endpoint and
//! returns the rendered image reference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::error::{ClientError, ClientResult};

/// Generator result; the image may be missing when the model declined
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    #[serde(default)]
    pub rendered_image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    source_image: &'a str,
}

#[async_trait]
pub trait RenderGenerator: Send + Sync {
    async fn generate(&self, source_image: &str) -> ClientResult<RenderOutput>;
}

/// Generator reached over HTTP: `POST <url>` with `{sourceImage}`
pub struct HttpRenderGenerator {
    http_client: reqwest::Client,
    url: String,
}

impl HttpRenderGenerator {
    pub fn new(url: &str) -> ClientResult<Self> {
        // Renders are slow; allow a generous window
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()?;

        Ok(Self {
            http_client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RenderGenerator for HttpRenderGenerator {
    async fn generate(&self, source_image: &str) -> ClientResult<RenderOutput> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&RenderRequest { source_image })
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

        let output: RenderOutput = response.json().await?;
        info!(
            has_image = output.rendered_image.is_some(),
            "Render generation finished"
        );
        Ok(output)
    }
}
