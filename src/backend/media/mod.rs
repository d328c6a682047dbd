//! Media Module
//!
//! Uploaded images and videos are handed to a [`MediaStore`], which returns
//! a durable URL and the detected media kind. Messages only carry that
//! reference. The bundled [`LocalMediaStore`] writes files into a directory
//! served under `/media`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::messaging::{MediaKind, MediaRef};

/// Upload handler
pub mod handlers;

pub use handlers::upload_media;

/// URL prefix the media directory is served under
pub const MEDIA_URL_PREFIX: &str = "/media";

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist an upload and return where it can be fetched
    async fn store(&self, file_name: Option<&str>, content_type: Option<&str>, data: Bytes) -> BackendResult<MediaRef>;
}

/// Stores uploads as `<uuid>.<ext>` in a local directory, with `.bin` for
/// anything that is not a known image or video extension
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    dir: PathBuf,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Extensions kept on stored files. Files are served from the API origin, so
/// nothing a browser would render as a document (html, svg, js) is allowed.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi"];

/// Extension used for every upload outside the allowlist
const FALLBACK_EXTENSION: &str = "bin";

/// Lowercase extension of a client file name, if it is on the allowlist
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    (IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())).then_some(ext)
}

/// Detect the kind from the declared content type, falling back to the extension
pub fn detect_kind(content_type: Option<&str>, extension: Option<&str>) -> MediaKind {
    if let Some(kind) = content_type.map(MediaKind::from_mime).filter(|k| *k != MediaKind::Other) {
        return kind;
    }
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => MediaKind::Image,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => MediaKind::Video,
        _ => MediaKind::Other,
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, file_name: Option<&str>, content_type: Option<&str>, data: Bytes) -> BackendResult<MediaRef> {
        if data.is_empty() {
            return Err(BackendError::invalid_argument("Uploaded file is empty"));
        }

        let extension = file_name.and_then(safe_extension);
        let kind = detect_kind(content_type, extension.as_deref());
        let stored_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension.as_deref().unwrap_or(FALLBACK_EXTENSION)
        );

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BackendError::internal(format!("Failed to create media directory: {}", e)))?;
        tokio::fs::write(self.dir.join(&stored_name), &data)
            .await
            .map_err(|e| BackendError::internal(format!("Failed to write media file: {}", e)))?;

        tracing::info!("[Media] Stored {} ({} bytes, {})", stored_name, data.len(), kind.as_str());
        Ok(MediaRef {
            url: format!("{}/{}", MEDIA_URL_PREFIX, stored_name),
            kind,
        })
    }
}
