//! Reconciliation log for cascades that could not finish.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::types::{current_timestamp, Collection, CommentId, PlaylistId, PostId, Result, VideoId, ID16};

/// Parent entity whose deletion triggers a cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CascadeTarget {
    /// Video: comments, likes on both, playlist entries, media
    Video(VideoId),
    /// Comment: likes
    Comment(CommentId),
    /// Post: likes
    Post(PostId),
    /// Playlist: nothing depends on it
    Playlist(PlaylistId),
}

impl CascadeTarget {
    /// Collection of the parent row
    pub fn collection(&self) -> Collection {
        match self {
            CascadeTarget::Video(_) => Collection::Videos,
            CascadeTarget::Comment(_) => Collection::Comments,
            CascadeTarget::Post(_) => Collection::Posts,
            CascadeTarget::Playlist(_) => Collection::Playlists,
        }
    }

    /// Identifier of the parent row
    pub fn id(&self) -> ID16 {
        match *self {
            CascadeTarget::Video(id)
            | CascadeTarget::Comment(id)
            | CascadeTarget::Post(id)
            | CascadeTarget::Playlist(id) => id,
        }
    }
}

impl std::fmt::Display for CascadeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.collection().noun(), self.id())
    }
}

/// Step of the cascade sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    /// Removing child entities
    Children,
    /// Removing edges that target the parent or its children
    Edges,
    /// Removing references held in playlists
    Detach,
    /// Removing the parent row
    Parent,
    /// Asking the media store to delete locators
    Media,
}

/// Work a reconciliation replay has to redo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Re-run the whole cascade for this parent
    Cascade(CascadeTarget),
    /// Only delete the recorded media locators
    OrphanedMedia,
}

/// Durable record of an unfinished cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationEntry {
    /// Entry identifier
    pub id: Uuid,
    /// What to redo
    pub action: ReconcileAction,
    /// Step that failed
    pub failed_step: CascadeStep,
    /// Failure description
    pub error: String,
    /// Media locators still to delete
    pub media: Vec<String>,
    /// Time the failure was recorded, in nanoseconds
    pub recorded_at: u64,
}

impl ReconciliationEntry {
    /// New entry stamped with the current time
    pub fn new(action: ReconcileAction, failed_step: CascadeStep, error: impl Into<String>, media: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            failed_step,
            error: error.into(),
            media,
            recorded_at: current_timestamp(),
        }
    }
}

/// Trait for reconciliation log implementations
pub trait ReconciliationLog: Send + Sync {
    /// Durably append an entry
    fn record(&self, entry: &ReconciliationEntry) -> Result<()>;

    /// Entries not yet resolved, oldest first
    fn pending(&self) -> Result<Vec<ReconciliationEntry>>;

    /// Mark an entry as resolved
    fn resolve(&self, id: Uuid) -> Result<()>;
}

/// In-memory reconciliation log
#[derive(Default)]
pub struct MemJournal {
    entries: Mutex<Vec<(ReconciliationEntry, bool)>>,
}

impl MemJournal {
    /// Empty journal
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReconciliationLog for MemJournal {
    fn record(&self, entry: &ReconciliationEntry) -> Result<()> {
        self.entries.lock().push((entry.clone(), false));
        Ok(())
    }

    fn pending(&self) -> Result<Vec<ReconciliationEntry>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|(_, resolved)| !resolved)
            .map(|(entry, _)| entry.clone())
            .collect())
    }

    fn resolve(&self, id: Uuid) -> Result<()> {
        for (entry, resolved) in self.entries.lock().iter_mut() {
            if entry.id == id {
                *resolved = true;
            }
        }
        Ok(())
    }
}
