//! Platform operations.
//!
//! [`Platform`] ties the entity store, the media store and the cascade
//! coordinator together. Every mutating call takes the acting user
//! explicitly; identifier-shaped arguments arrive as raw strings and are
//! validated before the store is touched.
//!
//! Mutations follow one ordering: parse identifiers, validate the payload
//! (holding the error back), load the entity, check ownership, report the
//! payload error, write. A non-owner therefore always gets `Unauthorized`,
//! whatever the payload looked like.

use std::sync::Arc;
use std::time::Duration;
use crate::cascade::{CascadeCoordinator, ReconciliationLog};
use crate::media::{with_timeout, MediaStore, MediaUpload, StoredMedia};
use crate::storage::{EntityStore, TypedStore};
use crate::types::{parse_id, Error, Record, Result, User, UserId, ID16};

mod videos;
mod comments;
mod posts;
mod playlists;
mod likes;
mod subscriptions;
mod dashboard;

#[cfg(test)]
mod tests;

pub use videos::{VideoListing, VideoUpdate};
pub use playlists::PlaylistUpdate;

/// Fields a video listing may be sorted on
pub const VIDEO_SORT_FIELDS: &[&str] = &["createdAt", "views", "duration", "title"];

/// Entry point for every platform operation
pub struct Platform<S: EntityStore> {
    store: Arc<S>,
    media: Arc<dyn MediaStore>,
    cascade: CascadeCoordinator<S>,
    media_timeout: Duration,
}

impl<S: EntityStore> Platform<S> {
    /// Assemble a platform
    pub fn new(
        store: Arc<S>,
        media: Arc<dyn MediaStore>,
        journal: Arc<dyn ReconciliationLog>,
        media_timeout: Duration,
    ) -> Self {
        let cascade = CascadeCoordinator::new(store.clone(), media.clone(), journal, media_timeout);
        Self { store, media, cascade, media_timeout }
    }

    /// Underlying entity store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cascade coordinator, for reconciliation and integrity sweeps
    pub fn cascade(&self) -> &CascadeCoordinator<S> {
        &self.cascade
    }

    /// Load a record or fail with `NotFound`
    fn load<R: Record>(&self, id: &ID16) -> Result<R> {
        self.store
            .find(id)?
            .ok_or_else(|| Error::not_found(format!("{} {id}", R::COLLECTION.noun())))
    }

    /// Parse a user id and make sure the user exists
    fn existing_user(&self, what: &str, raw: &str) -> Result<UserId> {
        let id = parse_id(what, raw)?;
        self.load::<User>(&id)?;
        Ok(id)
    }

    /// Hand an upload to the media store under the configured deadline
    async fn upload(&self, upload: MediaUpload) -> Result<StoredMedia> {
        if upload.bytes.is_empty() {
            return Err(Error::invalid_argument(format!("{} file is required", upload.kind.as_str())));
        }
        Ok(with_timeout(self.media_timeout, self.media.store(upload)).await?)
    }

    /// Best-effort removal of media no row references; failures are journaled
    async fn discard(&self, locators: Vec<String>) {
        if locators.is_empty() {
            return;
        }
        if let Err(e) = self.cascade.discard_media(locators).await {
            tracing::warn!(error = %e, "unreferenced media kept for reconciliation");
        }
    }
}

/// Trimmed non-blank text, or `InvalidArgument` naming the field
fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::invalid_argument(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Like [`required_text`] for optional fields: absent stays absent
fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>> {
    value.map(|v| required_text(field, v)).transpose()
}
