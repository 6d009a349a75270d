//! Floor-plan upload session
//!
//! Validates a picked or dropped file, encodes it inline, plays a short
//! progress animation, then hands the inline image to a completion callback.
//!
//! ```text
//! Empty -> Dragging -> HasFile(0..=100) -> Complete
//!                                     \-> Empty (+ error) on rejection
//! ```
//!
//! Observers follow the state through [`UploadSession::subscribe`]. Cancelling
//! the token passed to [`UploadSession::process_file`] stops all timers and
//! guarantees the callback is never invoked afterwards.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data_url::encode_data_url;

const MIB: u64 = 1024 * 1024;

/// Largest accepted floor plan
pub const MAX_UPLOAD_BYTES: u64 = 50 * MIB;
pub const PROGRESS_STEP: u8 = 15;
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
pub const REDIRECT_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub progress_step: u8,
    pub progress_interval: Duration,
    pub redirect_delay: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            progress_step: PROGRESS_STEP,
            progress_interval: PROGRESS_INTERVAL,
            redirect_delay: REDIRECT_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Empty,
    Dragging,
    HasFile { name: String, progress: u8 },
    Complete { name: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload an image file (JPG or PNG)")]
    NotAnImage { mime_type: Option<String> },

    #[error("File is too large. Maximum file size is {} MB.", .max / MIB)]
    TooLarge { size: u64, max: u64 },

    #[error("Sign in to upload your floor plan")]
    NotSignedIn,

    #[error("Upload failed: {0}")]
    CallbackFailed(String),

    #[error("Upload cancelled")]
    Cancelled,
}

/// A picked or dropped file
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    /// Declared type; sniffed from the content when absent
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(str::to_string),
            bytes,
        }
    }

    /// Read a file from disk; the MIME type is sniffed later
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            mime_type: None,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Declared MIME type, else sniffed from the leading bytes
    pub fn effective_mime_type(&self) -> Option<String> {
        self.mime_type
            .clone()
            .filter(|mime| !mime.is_empty())
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.mime_type().to_string()))
    }
}

pub struct UploadSession {
    config: UploadConfig,
    signed_in: bool,
    state: watch::Sender<UploadState>,
    error: Option<String>,
}

impl UploadSession {
    pub fn new(config: UploadConfig, signed_in: bool) -> Self {
        let (state, _) = watch::channel(UploadState::Empty);
        Self {
            config,
            signed_in,
            state,
            error: None,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Inline error message, if the last attempt failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_signed_in(&mut self, signed_in: bool) {
        self.signed_in = signed_in;
    }

    pub fn drag_over(&mut self) {
        if self.signed_in && self.state() == UploadState::Empty {
            self.state.send_replace(UploadState::Dragging);
        }
    }

    pub fn drag_leave(&mut self) {
        if self.state() == UploadState::Dragging {
            self.state.send_replace(UploadState::Empty);
        }
    }

    /// Check type and size; returns the accepted MIME type
    pub fn validate(&self, file: &UploadFile) -> Result<String, UploadError> {
        let mime_type = file.effective_mime_type();
        let Some(mime_type) = mime_type.filter(|mime| mime.starts_with("image/")) else {
            return Err(UploadError::NotAnImage {
                mime_type: file.effective_mime_type(),
            });
        };

        if file.size() > self.config.max_bytes {
            return Err(UploadError::TooLarge {
                size: file.size(),
                max: self.config.max_bytes,
            });
        }

        Ok(mime_type)
    }

    /// Accept a file and drive it to completion
    ///
    /// `on_complete` receives the inline data URL. Returning `Err` or
    /// `Ok(false)` resets the session with an inline error.
    pub async fn process_file<F, Fut>(
        &mut self,
        file: UploadFile,
        on_complete: F,
        cancel: &CancellationToken,
    ) -> Result<String, UploadError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        if !self.signed_in {
            debug!("Ignoring file while signed out");
            self.state.send_replace(UploadState::Empty);
            return Err(UploadError::NotSignedIn);
        }

        let mime_type = match self.validate(&file) {
            Ok(mime_type) => mime_type,
            Err(e) => return Err(self.fail(e)),
        };

        self.error = None;
        let name = file.name.clone();
        self.state.send_replace(UploadState::HasFile {
            name: name.clone(),
            progress: 0,
        });
        let data_url = encode_data_url(&mime_type, &file.bytes);
        drop(file);

        let step = self.config.progress_step.max(1);
        let period = self.config.progress_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        let mut progress: u8 = 0;
        while progress < 100 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(self.cancelled()),
                _ = ticker.tick() => {
                    progress = progress.saturating_add(step).min(100);
                    self.state.send_replace(UploadState::HasFile {
                        name: name.clone(),
                        progress,
                    });
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(self.cancelled()),
            _ = sleep(self.config.redirect_delay) => {}
        }

        match on_complete(data_url.clone()).await {
            Ok(true) => {
                info!(file = %name, "Upload complete");
                self.state.send_replace(UploadState::Complete { name });
                Ok(data_url)
            }
            Ok(false) => Err(self.fail(UploadError::CallbackFailed(
                "the floor plan was not accepted".to_string(),
            ))),
            Err(e) => Err(self.fail(UploadError::CallbackFailed(e.to_string()))),
        }
    }

    fn fail(&mut self, error: UploadError) -> UploadError {
        warn!("Upload rejected: {}", error);
        self.error = Some(error.to_string());
        self.state.send_replace(UploadState::Empty);
        error
    }

    fn cancelled(&mut self) -> UploadError {
        debug!("Upload cancelled");
        self.state.send_replace(UploadState::Empty);
        UploadError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn fast_config() -> UploadConfig {
        UploadConfig {
            progress_step: 25,
            progress_interval: Duration::from_millis(1),
            redirect_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn png(name: &str) -> UploadFile {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0; 32]);
        UploadFile::new(name, Some("image/png"), bytes)
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_non_image_without_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut session = UploadSession::new(UploadConfig::default(), true);
        let cancel = CancellationToken::new();

        let huge = UploadFile::new("plan.png", Some("image/png"), vec![0; 60 * 1024 * 1024]);
        let counter = calls.clone();
        let result = session
            .process_file(
                huge,
                |_| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));
        assert_eq!(session.state(), UploadState::Empty);
        assert!(session.error().unwrap().contains("50 MB"));

        let text = UploadFile::new("notes.txt", Some("text/plain"), b"hello".to_vec());
        let counter = calls.clone();
        let result = session
            .process_file(
                text,
                |_| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(UploadError::NotAnImage { .. })));
        assert_eq!(session.state(), UploadState::Empty);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mime_is_sniffed_when_not_declared() {
        let session = UploadSession::new(UploadConfig::default(), true);
        let mut file = png("plan");
        file.mime_type = None;
        assert_eq!(session.validate(&file).unwrap(), "image/png");

        let unknown = UploadFile::new("blob", None, b"plain words".to_vec());
        assert!(matches!(
            session.validate(&unknown),
            Err(UploadError::NotAnImage { mime_type: None })
        ));
    }

    #[tokio::test]
    async fn test_completes_with_data_url_and_full_progress() {
        let mut session = UploadSession::new(fast_config(), true);
        let mut states = session.subscribe();
        let cancel = CancellationToken::new();
        let received = Arc::new(std::sync::Mutex::new(None::<String>));

        let sink = received.clone();
        let data_url = session
            .process_file(
                png("plan.png"),
                |url| async move {
                    *sink.lock().unwrap() = Some(url);
                    Ok(true)
                },
                &cancel,
            )
            .await
            .unwrap();

        assert!(data_url.starts_with("data:image/png;base64,"));
        assert_eq!(received.lock().unwrap().as_deref(), Some(data_url.as_str()));
        assert_eq!(
            session.state(),
            UploadState::Complete {
                name: "plan.png".to_string()
            }
        );
        assert!(states.has_changed().unwrap());
        assert!(session.error().is_none());
        let _ = states.borrow_and_update();
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let mut session = UploadSession::new(fast_config(), true);
        let mut states = session.subscribe();
        let cancel = CancellationToken::new();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while states.changed().await.is_ok() {
                if let UploadState::HasFile { progress, .. } = &*states.borrow_and_update() {
                    seen.push(*progress);
                }
            }
            seen
        });

        session
            .process_file(png("plan.png"), |_| async { Ok(true) }, &cancel)
            .await
            .unwrap();
        drop(session);

        let seen = watcher.await.unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[tokio::test]
    async fn test_zero_progress_step_still_completes() {
        let config = UploadConfig {
            progress_step: 0,
            progress_interval: Duration::ZERO,
            ..fast_config()
        };
        let mut session = UploadSession::new(config, true);
        let cancel = CancellationToken::new();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            session.process_file(png("plan.png"), |_| async { Ok(true) }, &cancel),
        )
        .await
        .expect("progress should reach 100");

        assert!(result.is_ok());
        assert!(matches!(session.state(), UploadState::Complete { .. }));
    }

    #[tokio::test]
    async fn test_callback_failure_resets_with_error() {
        let cancel = CancellationToken::new();

        let mut session = UploadSession::new(fast_config(), true);
        let result = session
            .process_file(png("a.png"), |_| async { Ok(false) }, &cancel)
            .await;
        assert!(matches!(result, Err(UploadError::CallbackFailed(_))));
        assert_eq!(session.state(), UploadState::Empty);
        assert!(session.error().is_some());

        let result = session
            .process_file(
                png("b.png"),
                |_| async { Err(anyhow::anyhow!("render service down")) },
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(UploadError::CallbackFailed(ref m)) if m.contains("render service down")));
        assert_eq!(session.state(), UploadState::Empty);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = UploadConfig {
            progress_interval: Duration::from_secs(60),
            ..Default::default()
        };
        let mut session = UploadSession::new(config, true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let counter = calls.clone();
        let result = session
            .process_file(
                png("plan.png"),
                |_| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(true)
                },
                &cancel,
            )
            .await;

        assert_eq!(result, Err(UploadError::Cancelled));
        assert_eq!(session.state(), UploadState::Empty);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signed_out_ignores_files_and_drags() {
        let mut session = UploadSession::new(fast_config(), false);
        let cancel = CancellationToken::new();

        session.drag_over();
        assert_eq!(session.state(), UploadState::Empty);

        let result = session
            .process_file(png("plan.png"), |_| async { Ok(true) }, &cancel)
            .await;
        assert_eq!(result, Err(UploadError::NotSignedIn));
        assert!(session.error().is_none());
    }

    #[test]
    fn test_drag_state_transitions() {
        let mut session = UploadSession::new(UploadConfig::default(), true);
        session.drag_over();
        assert_eq!(session.state(), UploadState::Dragging);
        session.drag_leave();
        assert_eq!(session.state(), UploadState::Empty);
    }
}
