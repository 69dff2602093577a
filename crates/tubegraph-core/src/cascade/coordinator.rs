//! Cascade coordinator
//!
//! Removes a parent entity together with everything that references it, in
//! the order children, edges, playlist references, parent, media. A failure
//! at any step leaves a reconciliation entry behind and surfaces as
//! `Internal`; the caller never sees success while dependents remain.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use crate::cascade::journal::{CascadeStep, CascadeTarget, ReconcileAction, ReconciliationEntry, ReconciliationLog};
use crate::constants::{ID_FIELD, UPDATED_AT_FIELD};
use crate::media::{with_timeout, MediaStore};
use crate::storage::{EntityStore, Patch, StoreResult};
use crate::system::metrics::Metrics;
use crate::types::{current_timestamp, Collection, Error, MediaError, Result};
use crate::view::{Filter, ViewQuery};

/// A failed cascade step
struct StepFailure {
    step: CascadeStep,
    error: Error,
}

type StepResult<T> = std::result::Result<T, StepFailure>;

fn at<T>(step: CascadeStep, result: StoreResult<T>) -> StepResult<T> {
    result.map_err(|e| StepFailure { step, error: e.into() })
}

/// Rows removed by one pass over a parent's dependents
#[derive(Debug, Default)]
struct Removal {
    parent: Option<Value>,
    dependents: u64,
}

/// Outcome of a reconciliation replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Entries replayed to completion and marked resolved
    pub resolved: usize,
    /// Entries that failed again and stay pending
    pub pending: usize,
    /// Dependents removed by the sweep that follows a replay
    pub swept: usize,
}

/// Dangling references found by an integrity sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Comments whose video no longer exists
    pub orphaned_comments: usize,
    /// Likes whose target no longer exists
    pub dangling_likes: usize,
    /// Subscriptions whose channel no longer exists
    pub dangling_subscriptions: usize,
    /// Playlist entries naming a deleted video
    pub stale_playlist_entries: usize,
    /// Whether the findings were removed
    pub repaired: bool,
}

impl SweepReport {
    /// Total number of findings
    pub fn total(&self) -> usize {
        self.orphaned_comments + self.dangling_likes + self.dangling_subscriptions + self.stale_playlist_entries
    }

    /// Whether nothing dangles
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Removes parents with their dependents and replays unfinished removals
pub struct CascadeCoordinator<S: EntityStore> {
    store: Arc<S>,
    media: Arc<dyn MediaStore>,
    journal: Arc<dyn ReconciliationLog>,
    media_timeout: Duration,
}

impl<S: EntityStore> CascadeCoordinator<S> {
    /// Create a coordinator over a store, a media store and a journal
    pub fn new(
        store: Arc<S>,
        media: Arc<dyn MediaStore>,
        journal: Arc<dyn ReconciliationLog>,
        media_timeout: Duration,
    ) -> Self {
        Self { store, media, journal, media_timeout }
    }

    /// Reconciliation log this coordinator writes to
    pub fn journal(&self) -> &Arc<dyn ReconciliationLog> {
        &self.journal
    }

    /// Delete a parent and everything depending on it, returning the removed row
    ///
    /// A parent that does not exist (or vanishes mid-cascade) is `NotFound`.
    pub async fn delete(&self, target: CascadeTarget) -> Result<Value> {
        let Some(parent) = self.store.get(target.collection(), &target.id())? else {
            return Err(Error::not_found(target.to_string()));
        };
        let media = media_locators(target, &parent);

        let removal = match self.remove_rows(target) {
            Ok(removal) => removal,
            Err(failure) => {
                return Err(self.fail(ReconcileAction::Cascade(target), failure.step, &failure.error, media));
            }
        };
        let Some(parent) = removal.parent else {
            debug!(%target, "parent vanished during cascade");
            return Err(Error::not_found(target.to_string()));
        };

        let (left, reason) = self.release_media(media).await;
        if !left.is_empty() {
            return Err(self.fail(ReconcileAction::OrphanedMedia, CascadeStep::Media, &Error::internal(reason), left));
        }

        let metrics = Metrics::global();
        metrics.cascade.completed.inc();
        metrics.cascade.dependents_removed.inc_by(removal.dependents);
        info!(%target, dependents = removal.dependents, "cascade completed");
        Ok(parent)
    }

    /// Delete media that no row references any more
    ///
    /// Locators the media store refuses are journaled as orphaned media.
    pub async fn discard_media(&self, locators: Vec<String>) -> Result<()> {
        let (left, reason) = self.release_media(locators).await;
        if left.is_empty() {
            Ok(())
        } else {
            Err(self.fail(ReconcileAction::OrphanedMedia, CascadeStep::Media, &Error::internal(reason), left))
        }
    }

    /// Replay every pending reconciliation entry
    ///
    /// Replays are idempotent: a parent that is already gone counts as
    /// removed. After a video cascade has been replayed a repairing sweep
    /// removes likes on comments deleted by the interrupted attempt.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let mut replayed_video = false;

        for entry in self.journal.pending()? {
            if let ReconcileAction::Cascade(target) = entry.action {
                match self.remove_rows(target) {
                    Ok(removal) => {
                        replayed_video |= matches!(target, CascadeTarget::Video(_));
                        Metrics::global().cascade.dependents_removed.inc_by(removal.dependents);
                    }
                    Err(failure) => {
                        warn!(entry = %entry.id, %target, step = ?failure.step, error = %failure.error, "replay failed");
                        report.pending += 1;
                        continue;
                    }
                }
            }

            let (left, reason) = self.release_media(entry.media.clone()).await;
            if !left.is_empty() {
                warn!(entry = %entry.id, pending_media = left.len(), %reason, "media still not released");
                report.pending += 1;
                continue;
            }

            self.journal.resolve(entry.id)?;
            Metrics::global().cascade.reconciled.inc();
            report.resolved += 1;
        }

        if replayed_video {
            report.swept = self.sweep(true)?.total();
        }
        info!(resolved = report.resolved, pending = report.pending, swept = report.swept, "reconciliation finished");
        Ok(report)
    }

    /// Scan for references to entities that no longer exist
    ///
    /// With `repair` the findings are removed as well.
    pub fn sweep(&self, repair: bool) -> Result<SweepReport> {
        let videos = self.ids(Collection::Videos)?;
        let posts = self.ids(Collection::Posts)?;
        let users = self.ids(Collection::Users)?;

        let comments = self.rows(Collection::Comments)?;
        let (live, orphaned): (Vec<&Value>, Vec<&Value>) = comments
            .iter()
            .partition(|row| row.get("video").and_then(Value::as_str).is_some_and(|v| videos.contains(v)));
        let live_comments: HashSet<&str> = live
            .iter()
            .filter_map(|row| row.get(ID_FIELD).and_then(Value::as_str))
            .collect();
        let orphaned_comments: Vec<Value> = orphaned.iter().filter_map(|row| row.get(ID_FIELD).cloned()).collect();

        let dangling_likes = self.dangling_edges(Collection::Likes, |kind, id| match kind {
            "video" => videos.contains(id),
            "comment" => live_comments.contains(id),
            "post" => posts.contains(id),
            _ => false,
        })?;
        let dangling_subscriptions =
            self.dangling_edges(Collection::Subscriptions, |kind, id| kind == "channel" && users.contains(id))?;

        let stale_videos: HashSet<String> = self
            .rows(Collection::Playlists)?
            .iter()
            .filter_map(|row| row.get("videos").and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str)
            .filter(|id| !videos.contains(*id))
            .map(str::to_string)
            .collect();
        let stale_playlist_entries = self
            .rows(Collection::Playlists)?
            .iter()
            .filter_map(|row| row.get("videos").and_then(Value::as_array))
            .flatten()
            .filter(|id| id.as_str().is_some_and(|id| stale_videos.contains(id)))
            .count();

        let report = SweepReport {
            orphaned_comments: orphaned_comments.len(),
            dangling_likes: dangling_likes.len(),
            dangling_subscriptions: dangling_subscriptions.len(),
            stale_playlist_entries,
            repaired: repair,
        };

        if repair && !report.is_clean() {
            self.store.delete_many(Collection::Comments, &Filter::is_in(ID_FIELD, orphaned_comments))?;
            self.store.delete_many(Collection::Likes, &Filter::is_in(ID_FIELD, dangling_likes))?;
            self.store.delete_many(Collection::Subscriptions, &Filter::is_in(ID_FIELD, dangling_subscriptions))?;
            for video in stale_videos {
                let detach = Patch::new().pull("videos", video.as_str()).set(UPDATED_AT_FIELD, current_timestamp());
                self.store.update_many(Collection::Playlists, &Filter::eq("videos", video.as_str()), &detach)?;
            }
            Metrics::global().cascade.dependents_removed.inc_by(report.total() as u64);
            info!(removed = report.total(), "dangling references removed");
        } else if !report.is_clean() {
            warn!(?report, "dangling references found");
        }

        Ok(report)
    }

    /// Remove dependents and the parent row; the parent may already be gone
    fn remove_rows(&self, target: CascadeTarget) -> StepResult<Removal> {
        let id = target.id();
        let mut dependents = 0u64;

        if let CascadeTarget::Video(_) = target {
            let comments = at(
                CascadeStep::Children,
                self.store.delete_many(Collection::Comments, &Filter::eq("video", id)),
            )?;
            let comment_ids: Vec<Value> = comments.iter().filter_map(|row| row.get(ID_FIELD).cloned()).collect();
            dependents += comments.len() as u64;

            let likes = likes_on("video", vec![Value::from(id)]).or(likes_on("comment", comment_ids));
            let removed = at(CascadeStep::Edges, self.store.delete_many(Collection::Likes, &likes))?;
            dependents += removed.len() as u64;

            let detach = Patch::new().pull("videos", id).set(UPDATED_AT_FIELD, current_timestamp());
            dependents += at(
                CascadeStep::Detach,
                self.store.update_many(Collection::Playlists, &Filter::eq("videos", id), &detach),
            )?;
        }

        let edge_type = match target {
            CascadeTarget::Comment(_) => Some("comment"),
            CascadeTarget::Post(_) => Some("post"),
            _ => None,
        };
        if let Some(edge_type) = edge_type {
            let likes = likes_on(edge_type, vec![Value::from(id)]);
            let removed = at(CascadeStep::Edges, self.store.delete_many(Collection::Likes, &likes))?;
            dependents += removed.len() as u64;
        }

        let parent = at(CascadeStep::Parent, self.store.delete(target.collection(), &id))?;
        debug!(%target, dependents, parent_removed = parent.is_some(), "cascade rows removed");
        Ok(Removal { parent, dependents })
    }

    /// Delete media concurrently; returns the locators still stored and why
    async fn release_media(&self, locators: Vec<String>) -> (Vec<String>, String) {
        let mut tasks = JoinSet::new();
        for locator in locators.iter().cloned() {
            let media = self.media.clone();
            let limit = self.media_timeout;
            tasks.spawn(async move {
                let result = with_timeout(limit, media.delete(&locator)).await;
                (locator, result)
            });
        }

        let mut released = HashSet::new();
        let mut reasons = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((locator, Ok(()) | Err(MediaError::NotFound(_)))) => {
                    released.insert(locator);
                }
                Ok((locator, Err(e))) => reasons.push(format!("{locator}: {e}")),
                Err(e) => reasons.push(format!("media task failed: {e}")),
            }
        }

        let left = locators.into_iter().filter(|l| !released.contains(l)).collect();
        (left, reasons.join("; "))
    }

    /// Journal a failed cascade and build the error returned to the caller
    fn fail(&self, action: ReconcileAction, step: CascadeStep, cause: &Error, media: Vec<String>) -> Error {
        Metrics::global().cascade.failed.inc();
        let entry = ReconciliationEntry::new(action, step, cause.to_string(), media);
        match self.journal.record(&entry) {
            Ok(()) => {
                error!(entry = %entry.id, ?action, ?step, error = %cause, "cascade incomplete, recorded for reconciliation");
                Error::internal(format!("cascade incomplete at {step:?}: {cause}"))
            }
            Err(journal_error) => {
                error!(?action, ?step, error = %cause, %journal_error, "cascade incomplete and journal write failed");
                Error::internal(format!(
                    "cascade incomplete at {step:?}: {cause}; reconciliation entry lost: {journal_error}"
                ))
            }
        }
    }

    fn rows(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self.store.query(&ViewQuery::from(collection).build())?)
    }

    fn ids(&self, collection: Collection) -> Result<HashSet<String>> {
        Ok(self
            .rows(collection)?
            .into_iter()
            .filter_map(|row| row.get(ID_FIELD).and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    fn dangling_edges(&self, collection: Collection, live: impl Fn(&str, &str) -> bool) -> Result<Vec<Value>> {
        Ok(self
            .rows(collection)?
            .into_iter()
            .filter(|edge| {
                let kind = edge.pointer("/target/type").and_then(Value::as_str).unwrap_or_default();
                let id = edge.pointer("/target/id").and_then(Value::as_str).unwrap_or_default();
                !live(kind, id)
            })
            .filter_map(|edge| edge.get(ID_FIELD).cloned())
            .collect())
    }
}

/// Likes on targets of one type with any of the given ids
fn likes_on(target_type: &str, ids: Vec<Value>) -> Filter {
    Filter::eq("target.type", target_type).and(Filter::is_in("target.id", ids))
}

/// Media locators held by a parent row
fn media_locators(target: CascadeTarget, parent: &Value) -> Vec<String> {
    match target {
        CascadeTarget::Video(_) => ["videoFile", "thumbnail"]
            .iter()
            .filter_map(|field| parent.get(*field).and_then(Value::as_str))
            .filter(|locator| !locator.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
