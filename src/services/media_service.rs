// MediaService - Query handler for media metadata and binary resolution
//
// Two concerns: expanding media ids into presentation elements with
// localized titles, and resolving a media record's stored path into a
// readable file. The error type keeps "record absent" (a 404) distinct
// from "record present, file gone" (a 500).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::repository::KeyStore;
use crate::shaping::{shape_media_elements, MediaElement};
use crate::types::ValidatedMediaId;

/// Which stored path of a media record to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaVariantKind {
    Full,
    Thumbnail,
}

/// Failure modes of media file resolution
#[derive(Debug, Error)]
pub enum MediaFileError {
    /// No media record, or the record carries no path for this variant
    #[error("media record not found")]
    NotFound,
    /// The record exists but its stored path is stale
    #[error("stored media path does not exist: {0}")]
    MissingFile(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct MediaService {
    store: KeyStore,
    config: Arc<ApiConfig>,
}

impl MediaService {
    pub fn new(store: KeyStore, config: Arc<ApiConfig>) -> Self {
        Self { store, config }
    }

    /// Expand media ids into presentation elements with localized titles,
    /// preserving input order
    pub async fn media_elements(&self, ids: &[i64]) -> Result<Vec<MediaElement>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let titles = self.store.media_titles(ids).await?;
        Ok(shape_media_elements(ids, &titles, &self.config.public_url))
    }

    /// Resolve a media id to an absolute, existing file path
    pub async fn resolve_file(
        &self,
        media_id: ValidatedMediaId,
        kind: MediaVariantKind,
    ) -> Result<PathBuf, MediaFileError> {
        let record = self
            .store
            .media_file(media_id.as_i64())
            .await?
            .ok_or(MediaFileError::NotFound)?;

        let stored = match kind {
            MediaVariantKind::Full => record.file_path,
            MediaVariantKind::Thumbnail => record.thumbnail_path,
        };
        let stored = stored.ok_or(MediaFileError::NotFound)?;

        resolve_existing(&stored)
    }
}

/// Resolve a stored path against the filesystem. A missing file is the
/// stale-path case, reported separately from lookup failures.
pub fn resolve_existing(stored_path: &str) -> Result<PathBuf, MediaFileError> {
    let path = Path::new(stored_path);
    if !path.exists() {
        return Err(MediaFileError::MissingFile(stored_path.to_string()));
    }
    path.canonicalize()
        .map_err(|e| MediaFileError::Other(e.into()))
}

/// Content type for a media file, derived from its extension
pub fn media_content_type(path: &Path) -> mime::Mime {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        Some("mp4") => "video/mp4".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_existing_missing_path_is_stale() {
        let result = resolve_existing("/definitely/not/here/42.jpg");
        assert!(matches!(result, Err(MediaFileError::MissingFile(_))));
    }

    #[test]
    fn test_resolve_existing_returns_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"jpeg bytes").unwrap();

        let resolved = resolve_existing(file.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("photo.jpg"));
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(media_content_type(Path::new("a/b.JPG")), mime::IMAGE_JPEG);
        assert_eq!(media_content_type(Path::new("a/b.png")), mime::IMAGE_PNG);
        assert_eq!(
            media_content_type(Path::new("a/b")),
            mime::APPLICATION_OCTET_STREAM
        );
    }
}
