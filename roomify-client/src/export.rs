//! Writes an exported render to disk

use std::path::{Path, PathBuf};
use tracing::info;

use crate::data_url::{decode_data_url, is_data_url};
use crate::error::{ClientError, ClientResult};
use crate::hosting::is_hosted_url;
use crate::visualizer::ExportDownload;

/// Materialise `download` inside `dir`, returning the written path
///
/// Inline images are decoded; hosted images are fetched with `http_client`.
pub async fn write_export(
    download: &ExportDownload,
    dir: &Path,
    http_client: &reqwest::Client,
) -> ClientResult<PathBuf> {
    let bytes = if is_data_url(&download.image) {
        let (_, bytes) = decode_data_url(&download.image)
            .ok_or_else(|| ClientError::InvalidImage("malformed data URL".to_string()))?;
        bytes
    } else if is_hosted_url(&download.image) {
        let response = http_client.get(&download.image).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: format!("could not fetch {}", download.image),
            });
        }
        response.bytes().await?.to_vec()
    } else {
        return Err(ClientError::InvalidImage(download.image.clone()));
    };

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&download.file_name);
    tokio::fs::write(&path, &bytes).await?;

    info!(path = %path.display(), bytes = bytes.len(), "Exported render");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_url::encode_data_url;

    #[tokio::test]
    async fn test_writes_inline_image() {
        let dir = tempfile::tempdir().unwrap();
        let download = ExportDownload {
            file_name: "roomify-p1.png".to_string(),
            image: encode_data_url("image/png", b"render-bytes"),
        };

        let path = write_export(&download, dir.path(), &reqwest::Client::new())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("roomify-p1.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"render-bytes");
    }

    #[tokio::test]
    async fn test_rejects_unusable_reference() {
        let dir = tempfile::tempdir().unwrap();
        let download = ExportDownload {
            file_name: "roomify-p1.png".to_string(),
            image: "blob:abc".to_string(),
        };

        let result = write_export(&download, dir.path(), &reqwest::Client::new()).await;
        assert!(matches!(result, Err(ClientError::InvalidImage(_))));
        assert!(!dir.path().join("roomify-p1.png").exists());
    }
}
