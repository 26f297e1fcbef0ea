//! Object storage abstraction for thumbnail uploads.
//!
//! Object keys are namespaced by owner: the first path segment of every
//! key is the identity ID of the uploader (`<owner>/<name>`).

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Uploaded object metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (`<owner>/<name>`).
    pub key: String,
    /// Public URL to access the object.
    pub url: String,
    /// Object size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the object.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload an object.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Resolve a public URL back to its key, if it points into this backend.
    fn key_from_url(&self, url: &str) -> Option<String>;

    /// Whether a URL falls under this backend's public prefix, whether or
    /// not it names a valid key.
    fn owns_url(&self, url: &str) -> bool;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Build a key inside the owner's namespace.
#[must_use]
pub fn owner_scoped_key(owner_id: &str, name: &str) -> String {
    format!("{owner_id}/{name}")
}

/// Owner namespace of a key, or `None` if the key is malformed.
#[must_use]
pub fn object_owner(key: &str) -> Option<&str> {
    if key.starts_with('/') || key.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return None;
    }
    let (owner, rest) = key.split_once('/')?;
    if rest.is_empty() { None } else { Some(owner) }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if object_owner(key).is_none() {
            return Err(AppError::BadRequest(format!("Invalid object key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.url_prefix())
            .filter(|key| object_owner(key).is_some())
            .map(ToString::to_string)
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&self.url_prefix())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}
