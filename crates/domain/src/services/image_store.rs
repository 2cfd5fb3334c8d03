//! Image storage abstraction for profile, group and study-proof photos.
//!
//! Every upload gets its own key: a random id, the SHA-256 of the bytes and
//! an extension derived from the detected format. Two owners uploading the
//! same bytes never share a stored file. Callers treat uploads and deletes as
//! best effort.

use base64::{engine::general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

lazy_static! {
    /// Matches the key segment of a stored image URL.
    static ref IMAGE_KEY_REGEX: Regex =
        Regex::new(r"/images/([0-9a-f]{32}-[0-9a-f]{64}\.(?:png|jpg|gif|webp))(?:\?.*)?$").unwrap();

    static ref IMAGE_KEY_ONLY_REGEX: Regex =
        Regex::new(r"^[0-9a-f]{32}-[0-9a-f]{64}\.(?:png|jpg|gif|webp)$").unwrap();
}

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Image is not valid base64")]
    InvalidEncoding,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Image is empty")]
    Empty,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Detects the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}

/// A decoded image ready to be stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImageUpload {
    /// Decodes a base64 payload, optionally prefixed with a `data:` URL header.
    pub fn from_base64(encoded: &str, max_bytes: usize) -> Result<Self, ImageStoreError> {
        let payload = match encoded.split_once(";base64,") {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => encoded,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| ImageStoreError::InvalidEncoding)?;
        Self::from_bytes(bytes, max_bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, ImageStoreError> {
        if bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(ImageStoreError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        let format = ImageFormat::detect(&bytes).ok_or(ImageStoreError::UnsupportedFormat)?;
        Ok(Self {
            id: Uuid::new_v4(),
            bytes,
            format,
        })
    }

    /// Storage key, unique to this upload.
    pub fn key(&self) -> String {
        format!(
            "{}-{}.{}",
            self.id.simple(),
            shared::crypto::sha256_hex_bytes(&self.bytes),
            self.format.extension()
        )
    }
}

/// Extracts the storage key from a URL produced by an [`ImageStore`].
///
/// Returns `None` for URLs this service did not issue.
pub fn extract_image_key(url: &str) -> Option<String> {
    IMAGE_KEY_REGEX
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether `key` has the shape of a stored image key. Rejects anything that
/// could escape the images directory.
pub fn is_valid_image_key(key: &str) -> bool {
    IMAGE_KEY_ONLY_REGEX.is_match(key)
}

/// Backend that stores image bytes and hands out public URLs.
#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn put(&self, image: &ImageUpload) -> Result<String, ImageStoreError>;

    /// Deletes the image behind `url`. Returns false if there was nothing to delete.
    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError>;
}

/// In-memory image store for development and testing.
#[derive(Debug, Default)]
pub struct MockImageStore {
    /// Whether `put` simulates a storage failure.
    pub fail_puts: bool,
    /// Whether `delete` simulates a storage failure.
    pub fail_deletes: bool,
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// A store that accepts uploads but fails every delete.
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.images.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ImageStore for MockImageStore {
    async fn put(&self, image: &ImageUpload) -> Result<String, ImageStoreError> {
        if self.fail_puts {
            tracing::warn!("Mock image store simulating upload failure");
            return Err(ImageStoreError::Storage("Simulated failure".to_string()));
        }
        let key = image.key();
        self.images
            .lock()
            .map_err(|e| ImageStoreError::Storage(e.to_string()))?
            .insert(key.clone(), image.bytes.clone());
        Ok(format!("mock://images/{}", key))
    }

    async fn delete(&self, url: &str) -> Result<bool, ImageStoreError> {
        if self.fail_deletes {
            tracing::warn!(url = %url, "Mock image store simulating delete failure");
            return Err(ImageStoreError::Storage("Simulated failure".to_string()));
        }
        let Some(key) = extract_image_key(url) else {
            return Ok(false);
        };
        Ok(self
            .images
            .lock()
            .map_err(|e| ImageStoreError::Storage(e.to_string()))?
            .remove(&key)
            .is_some())
    }
}
