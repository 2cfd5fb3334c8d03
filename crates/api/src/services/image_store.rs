//! Filesystem-backed image store.
//!
//! Files are written under `images_dir` using the upload's key and served back
//! by the `/images/:key` route.

use async_trait::async_trait;
use domain::services::image_store::{extract_image_key, ImageStore, ImageStoreError, ImageUpload};
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::config::StorageConfig;
use crate::middleware::metrics::record_image_failure;

#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.images_dir, &config.public_base_url)
    }

    /// Public URL for a stored key.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/images/{}", self.public_base_url, key)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

fn storage_error(err: std::io::Error) -> ImageStoreError {
    ImageStoreError::Storage(err.to_string())
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, image: &ImageUpload) -> Result<String, ImageStoreError> {
        let key = image.key();

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(storage_error)?;
        tokio::fs::write(self.path_for(&key), &image.bytes)
            .await
            .map_err(storage_error)?;
        tracing::debug!(key = %key, bytes = image.bytes.len(), "Stored image");

        Ok(self.url_for(&key))
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError> {
        let Some(key) = extract_image_key(url) else {
            tracing::debug!(url = %url, "Not a stored image URL, nothing to delete");
            return Ok(false);
        };

        match tokio::fs::remove_file(self.path_for(&key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(e)),
        }
    }
}

/// Decodes an optional base64 payload. Malformed images are client errors.
pub fn decode_upload(
    encoded: Option<&str>,
    max_bytes: usize,
) -> Result<Option<ImageUpload>, ImageStoreError> {
    encoded
        .filter(|e| !e.trim().is_empty())
        .map(|e| ImageUpload::from_base64(e, max_bytes))
        .transpose()
}

/// Stores an image, logging and swallowing storage failures.
pub async fn store_best_effort(store: &dyn ImageStore, image: &ImageUpload) -> Option<String> {
    match store.put(image).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(error = %e, key = %image.key(), "Image upload failed, continuing without image");
            record_image_failure("upload");
            None
        }
    }
}

/// Deletes a stored image, logging and swallowing failures.
pub async fn delete_best_effort(store: &dyn ImageStore, url: &str) -> bool {
    match store.delete(url).await {
        Ok(deleted) => deleted,
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Image delete failed, ignoring");
            record_image_failure("delete");
            false
        }
    }
}
