//! External media store contract.
//!
//! Media bytes are opaque to the core: it only hands uploads over, keeps the
//! returned locator on the entity, and asks for deletion when the entity goes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use crate::types::{MediaError, ID16};

/// What an upload contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A video file
    Video,
    /// A still image such as a thumbnail
    Image,
}

impl MediaKind {
    /// Directory-style name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// An upload handed to the media store
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Kind of media
    pub kind: MediaKind,
    /// Raw bytes
    pub bytes: Bytes,
}

impl MediaUpload {
    /// Video upload
    pub fn video(bytes: impl Into<Bytes>) -> Self {
        Self { kind: MediaKind::Video, bytes: bytes.into() }
    }

    /// Image upload
    pub fn image(bytes: impl Into<Bytes>) -> Self {
        Self { kind: MediaKind::Image, bytes: bytes.into() }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMedia {
    /// Opaque locator used for later deletion
    pub locator: String,
    /// Duration in seconds, when the store can tell
    pub duration: Option<f64>,
}

/// Trait for media store implementations
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist an upload and return its locator
    async fn store(&self, upload: MediaUpload) -> Result<StoredMedia, MediaError>;

    /// Delete the media behind a locator
    async fn delete(&self, locator: &str) -> Result<(), MediaError>;
}

/// Run a media call with a deadline
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, MediaError>
where
    F: std::future::Future<Output = Result<T, MediaError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(MediaError::Timeout(limit.as_millis() as u64)),
    }
}

/// In-memory media store
///
/// Deletions can be made to fail, which is how cascades exercise their
/// reconciliation path.
#[derive(Default)]
pub struct MemMediaStore {
    objects: DashMap<String, Bytes>,
    duration: Option<f64>,
    fail_deletes: AtomicBool,
    fail_stores: AtomicBool,
}

impl MemMediaStore {
    /// Empty store that reports no durations
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store that reports the given duration for every video
    pub fn with_duration(duration: f64) -> Self {
        Self { duration: Some(duration), ..Self::default() }
    }

    /// Make every delete fail until reset
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every store fail until reset
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    /// Whether a locator is currently stored
    pub fn contains(&self, locator: &str) -> bool {
        self.objects.contains_key(locator)
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl MediaStore for MemMediaStore {
    async fn store(&self, upload: MediaUpload) -> Result<StoredMedia, MediaError> {
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected("store disabled".into()));
        }
        let locator = format!("mem://{}/{}", upload.kind.as_str(), ID16::random());
        let duration = match upload.kind {
            MediaKind::Video => self.duration,
            MediaKind::Image => None,
        };
        self.objects.insert(locator.clone(), upload.bytes);
        Ok(StoredMedia { locator, duration })
    }

    async fn delete(&self, locator: &str) -> Result<(), MediaError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected(format!("delete of {locator} refused")));
        }
        self.objects
            .remove(locator)
            .map(|_| ())
            .ok_or_else(|| MediaError::NotFound(locator.to_string()))
    }
}
