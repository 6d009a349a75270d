//! Object hosting client
//!
//! Turns inline or remote image references into durable public URLs,
//! stored per project under a label (`source`, `rendered`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const SOURCE_LABEL: &str = "source";
pub const RENDERED_LABEL: &str = "rendered";

/// Image stored by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostedImage {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct UploadBody<'a> {
    image: &'a str,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, project_id: &str, label: &str, image: &str) -> ClientResult<HostedImage>;
}

/// True when a reference is already a durable public URL
///
/// Inline (`data:`), `blob:` and relative references are not.
pub fn is_hosted_url(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// Hosting service reached over HTTP: `PUT <base>/projects/<id>/<label>`
pub struct HttpImageHost {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpImageHost {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload(&self, project_id: &str, label: &str, image: &str) -> ClientResult<HostedImage> {
        let url = format!("{}/projects/{}/{}", self.base_url, project_id, label);
        debug!(project_id, label, "Uploading image to hosting");

        let response = self
            .http_client
            .put(&url)
            .json(&UploadBody { image })
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

        let hosted: HostedImage = response.json().await?;
        if !is_hosted_url(&hosted.url) {
            return Err(ClientError::InvalidImage(hosted.url));
        }
        Ok(hosted)
    }
}
