//! Filesystem-backed media store
//!
//! Uploads land under `<root>/<kind>/` and are named after the blake3 digest
//! of their content plus a per-upload id, so two identical uploads remain
//! independently deletable. Locators have the form `local://<kind>/<name>`.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tubegraph_core::media::{MediaKind, MediaStore, MediaUpload, StoredMedia};
use tubegraph_core::types::MediaError;
use tubegraph_core::ID16;

const SCHEME: &str = "local://";

/// [`MediaStore`] writing files below a root directory
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    /// Create the store, creating the kind directories as needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let root = root.into();
        for kind in [MediaKind::Video, MediaKind::Image] {
            tokio::fs::create_dir_all(root.join(kind.as_str())).await?;
        }
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a locator to a path inside the root
    fn resolve(&self, locator: &str) -> Result<PathBuf, MediaError> {
        let rest = locator
            .strip_prefix(SCHEME)
            .ok_or_else(|| MediaError::Rejected(format!("not a local locator: {}", locator)))?;
        let (kind, name) = rest
            .split_once('/')
            .ok_or_else(|| MediaError::Rejected(format!("malformed locator: {}", locator)))?;

        let kind_ok = kind == MediaKind::Video.as_str() || kind == MediaKind::Image.as_str();
        let name_ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !kind_ok || !name_ok {
            return Err(MediaError::Rejected(format!("malformed locator: {}", locator)));
        }

        Ok(self.root.join(kind).join(name))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: MediaUpload) -> Result<StoredMedia, MediaError> {
        let digest = blake3::hash(&upload.bytes);
        let name = format!("{}-{}", digest.to_hex(), ID16::random());
        let kind = upload.kind.as_str();
        let path = self.root.join(kind).join(&name);

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&upload.bytes).await?;
        file.sync_all().await?;

        debug!("Stored {} bytes of {} at {}", upload.bytes.len(), kind, path.display());
        Ok(StoredMedia {
            locator: format!("{}{}/{}", SCHEME, kind, name),
            // Duration needs a container parser; left to the caller
            duration: None,
        })
    }

    async fn delete(&self, locator: &str) -> Result<(), MediaError> {
        let path = self.resolve(locator)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MediaError::NotFound(locator.to_string())),
            Err(e) => Err(MediaError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let media = LocalMediaStore::open(dir.path()).await.unwrap();

        let stored = media.store(MediaUpload::video(b"frames".to_vec())).await.unwrap();
        assert!(stored.locator.starts_with("local://video/"));
        let path = media.resolve(&stored.locator).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"frames");

        media.delete(&stored.locator).await.unwrap();
        assert!(!path.exists());
        assert!(matches!(media.delete(&stored.locator).await, Err(MediaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_identical_uploads_get_distinct_locators() {
        let dir = tempfile::tempdir().unwrap();
        let media = LocalMediaStore::open(dir.path()).await.unwrap();

        let a = media.store(MediaUpload::image(b"thumb".to_vec())).await.unwrap();
        let b = media.store(MediaUpload::image(b"thumb".to_vec())).await.unwrap();
        assert_ne!(a.locator, b.locator);

        media.delete(&a.locator).await.unwrap();
        assert!(media.resolve(&b.locator).unwrap().exists());
    }

    #[tokio::test]
    async fn test_foreign_or_escaping_locators_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = LocalMediaStore::open(dir.path()).await.unwrap();

        for locator in ["mem://video/x", "local://video/../../etc", "local://audio/abc", "local://image/"] {
            assert!(matches!(media.delete(locator).await, Err(MediaError::Rejected(_))), "{locator}");
        }
    }
}
