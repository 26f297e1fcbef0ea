//! Thumbnail upload service.

use std::sync::Arc;

use image::ImageFormat;
use serde::Serialize;
use tracing::{info, warn};
use tutorhub_common::{
    AppError, AppResult, AuthContext, IdGenerator, StorageBackend, UploadedFile, owner_scoped_key,
};
use tutorhub_db::policy::{ObjectOperation, authorize_object};

use crate::validation::{MAX_URL_LENGTH, is_http_url};

/// Response for an uploaded thumbnail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
    pub md5: String,
}

impl From<UploadedFile> for ThumbnailResponse {
    fn from(f: UploadedFile) -> Self {
        Self {
            key: f.key,
            url: f.url,
            size: f.size,
            content_type: f.content_type,
            md5: f.md5,
        }
    }
}

/// Stores tutorial thumbnails under the uploader's namespace.
#[derive(Clone)]
pub struct ThumbnailService {
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_upload_bytes: u64,
}

impl ThumbnailService {
    /// Create a new thumbnail service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, max_upload_bytes: u64) -> Self {
        Self {
            storage,
            id_gen: IdGenerator::new(),
            max_upload_bytes,
        }
    }

    /// Largest accepted upload in bytes.
    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Check size and content of an upload without storing it.
    ///
    /// Returns the file extension and MIME type sniffed from the bytes; the
    /// client-declared content type is never trusted.
    pub fn inspect(&self, data: &[u8]) -> AppResult<(&'static str, &'static str)> {
        if data.len() as u64 > self.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Thumbnail exceeds {} bytes",
                self.max_upload_bytes
            )));
        }
        if data.is_empty() {
            return Err(AppError::Validation("Thumbnail is empty".to_string()));
        }

        let format = image::guess_format(data)
            .map_err(|_| AppError::Validation("Thumbnail is not an image".to_string()))?;

        match format {
            ImageFormat::Jpeg => Ok(("jpg", "image/jpeg")),
            ImageFormat::Png => Ok(("png", "image/png")),
            ImageFormat::Gif => Ok(("gif", "image/gif")),
            ImageFormat::WebP => Ok(("webp", "image/webp")),
            other => Err(AppError::Validation(format!(
                "Unsupported image format: {other:?}"
            ))),
        }
    }

    /// Store a thumbnail as `<caller id>/<generated id>.<ext>`.
    pub async fn upload(&self, ctx: &AuthContext, data: &[u8]) -> AppResult<UploadedFile> {
        let (ext, content_type) = self.inspect(data)?;

        let key = owner_scoped_key(
            &ctx.identity_id,
            &format!("{}.{ext}", self.id_gen.generate()),
        );
        authorize_object(Some(ctx), ObjectOperation::Write, &key)?;

        let uploaded = self.storage.upload(&key, data, content_type).await?;
        info!(key = %uploaded.key, size = uploaded.size, "Stored thumbnail");
        Ok(uploaded)
    }

    /// Delete a thumbnail by key.
    pub async fn delete(&self, ctx: &AuthContext, key: &str) -> AppResult<()> {
        authorize_object(Some(ctx), ObjectOperation::Delete, key)?;
        self.storage.delete(key).await
    }

    /// Delete the object behind a public URL, if it lives in our storage.
    ///
    /// Returns `false` for URLs that point elsewhere.
    pub async fn delete_by_url(&self, ctx: &AuthContext, url: &str) -> AppResult<bool> {
        let Some(key) = self.storage.key_from_url(url) else {
            return Ok(false);
        };
        self.delete(ctx, &key).await?;
        Ok(true)
    }

    /// Delete the object behind a URL, logging instead of failing.
    pub(crate) async fn discard(&self, ctx: &AuthContext, url: &str) {
        if let Err(e) = self.delete_by_url(ctx, url).await {
            warn!(url = %url, error = %e, "Failed to remove thumbnail");
        }
    }

    /// Check a thumbnail URL supplied directly by the client.
    ///
    /// URLs into our storage must name a valid key in the caller's
    /// namespace; anything else has to be an absolute http(s) URL.
    pub(crate) fn check_attachable(&self, ctx: &AuthContext, url: &str) -> AppResult<()> {
        if url.len() > MAX_URL_LENGTH {
            return Err(AppError::Validation(format!(
                "Thumbnail URL exceeds {MAX_URL_LENGTH} characters"
            )));
        }

        match self.storage.key_from_url(url) {
            Some(key) => authorize_object(Some(ctx), ObjectOperation::Write, &key),
            None if self.storage.owns_url(url) => Err(AppError::Validation(
                "Thumbnail URL does not name a stored object".to_string(),
            )),
            None if is_http_url(url) => Ok(()),
            None => Err(AppError::Validation(
                "Thumbnail URL must be an http(s) URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use tutorhub_common::LocalStorage;

    /// A 1x1 PNG.
    pub(crate) const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    pub(crate) fn temp_service(max: u64) -> (ThumbnailService, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tutorhub-thumbs-{}", ulid::Ulid::new()));
        let storage = LocalStorage::new(dir.clone(), "/files".to_string());
        (ThumbnailService::new(Arc::new(storage), max), dir)
    }

    #[test]
    fn test_inspect_sniffs_content() {
        let (service, _) = temp_service(1024);
        assert_eq!(service.inspect(PNG).unwrap(), ("png", "image/png"));
        assert!(matches!(
            service.inspect(b"definitely not an image"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(service.inspect(b""), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_inspect_rejects_oversize() {
        let (service, _) = temp_service(16);
        assert!(matches!(
            service.inspect(PNG),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_goes_to_owner_namespace() {
        let (service, dir) = temp_service(1024);
        let alice = AuthContext::new("alice", "t");

        let uploaded = service.upload(&alice, PNG).await.unwrap();
        assert!(uploaded.key.starts_with("alice/"));
        assert!(uploaded.key.ends_with(".png"));
        assert_eq!(uploaded.content_type, "image/png");
        assert!(uploaded.url.starts_with("/files/alice/"));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_delete_outside_namespace_is_forbidden() {
        let (service, dir) = temp_service(1024);
        let alice = AuthContext::new("alice", "t");
        let bob = AuthContext::new("bob", "t");

        let uploaded = service.upload(&alice, PNG).await.unwrap();
        let result = service.delete(&bob, &uploaded.key).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        assert!(service.delete_by_url(&alice, &uploaded.url).await.unwrap());
        assert!(!service.delete_by_url(&alice, "https://cdn.example.com/x.png").await.unwrap());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[test]
    fn test_check_attachable() {
        let (service, _) = temp_service(1024);
        let alice = AuthContext::new("alice", "t");
        assert!(service.check_attachable(&alice, "/files/alice/a.png").is_ok());
        assert!(service.check_attachable(&alice, "https://cdn.example.com/a.png").is_ok());
        assert!(matches!(
            service.check_attachable(&alice, "/files/bob/a.png"),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.check_attachable(&alice, "data:image/png;base64,AAAA"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.check_attachable(&alice, "/files/alice/../bob/a.png"),
            Err(AppError::Validation(_))
        ));

        let long = format!("https://cdn.example.com/{}.png", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            service.check_attachable(&alice, &long),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_check_attachable_rejects_bad_key_under_absolute_base() {
        let storage = LocalStorage::new(
            std::env::temp_dir().join("tutorhub-unused"),
            "http://host/files".to_string(),
        );
        let service = ThumbnailService::new(Arc::new(storage), 1024);
        let alice = AuthContext::new("alice", "t");

        assert!(matches!(
            service.check_attachable(&alice, "http://host/files/alice/../bob/x.png"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.check_attachable(&alice, "http://host/files/x.png"),
            Err(AppError::Validation(_))
        ));
        assert!(service.check_attachable(&alice, "http://host/files/alice/x.png").is_ok());
        assert!(matches!(
            service.check_attachable(&alice, "http://host/files/bob/x.png"),
            Err(AppError::Forbidden(_))
        ));
        assert!(service.check_attachable(&alice, "http://host/other/x.png").is_ok());
    }
}
