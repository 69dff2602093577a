use bytes::Bytes;
use tracing::{debug, info};
use crate::cascade::CascadeTarget;
use crate::constants::{ID_FIELD, UPDATED_AT_FIELD};
use crate::media::MediaUpload;
use crate::services::{optional_text, required_text, Platform, VIDEO_SORT_FIELDS};
use crate::storage::{EntityStore, Patch, TypedStore};
use crate::guard::authorize_owner;
use crate::types::{current_timestamp, parse_id, Collection, Error, Result, StoreError, UserId, Video, ID16};
use crate::view::rows::{decode_rows, VideoCard};
use crate::view::{CountJoin, Filter, Lookup, Page, SortSpec, ViewQuery};

/// Parameters of the public video listing
#[derive(Debug, Clone, Default)]
pub struct VideoListing {
    /// Page window
    pub page: Page,
    /// Free text matched against title and description
    pub query: Option<String>,
    /// Sort field, one of [`VIDEO_SORT_FIELDS`]
    pub sort_by: Option<String>,
    /// `"asc"` or anything else for descending
    pub sort_type: Option<String>,
    /// Only videos uploaded by this user
    pub user_id: Option<String>,
}

/// Changes to a video's details
#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New thumbnail image
    pub thumbnail: Option<Bytes>,
}

/// Video cards: owner profile plus like count
pub(super) fn card_query(filter: Filter) -> ViewQuery {
    ViewQuery::from(Collection::Videos)
        .filter(filter)
        .join(Lookup::profile("owner", "owner"))
        .count(CountJoin::likes("video", "likesCount"))
}

impl<S: EntityStore> Platform<S> {
    /// Published videos, optionally narrowed to one uploader and a text query
    pub fn list_videos(&self, listing: &VideoListing) -> Result<Vec<VideoCard>> {
        let owner = listing.user_id.as_deref().map(|raw| parse_id("user", raw)).transpose()?;
        let sort = SortSpec::from_raw(listing.sort_by.as_deref(), listing.sort_type.as_deref(), VIDEO_SORT_FIELDS)?;

        let mut filter = Filter::eq("isPublished", true);
        if let Some(owner) = owner {
            filter = filter.and(Filter::eq("owner", owner));
        }
        if let Some(needle) = listing.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            filter = filter.and(Filter::text(needle, &["title", "description"]));
        }

        let plan = card_query(filter).sort(sort).page(listing.page).build();
        decode_rows(self.store.query(&plan)?)
    }

    /// Upload a video with its thumbnail and store the new row
    ///
    /// Both files are uploaded concurrently. If either upload or the insert
    /// fails, whatever was already stored is discarded again.
    pub async fn publish_video(
        &self,
        actor: &UserId,
        title: &str,
        description: &str,
        video: Bytes,
        thumbnail: Bytes,
    ) -> Result<Video> {
        let title = required_text("title", title)?;
        let description = required_text("description", description)?;
        if video.is_empty() || thumbnail.is_empty() {
            return Err(Error::invalid_argument("video file and thumbnail are required"));
        }

        let (file, thumb) = tokio::join!(
            self.upload(MediaUpload::video(video)),
            self.upload(MediaUpload::image(thumbnail))
        );
        let (file, thumb) = match (file, thumb) {
            (Ok(file), Ok(thumb)) => (file, thumb),
            (Ok(stored), Err(e)) | (Err(e), Ok(stored)) => {
                self.discard(vec![stored.locator]).await;
                return Err(e);
            }
            (Err(e), Err(_)) => return Err(e),
        };

        let now = current_timestamp();
        let record = Video {
            id: ID16::random(),
            owner: *actor,
            title,
            description,
            video_file: file.locator,
            thumbnail: thumb.locator,
            duration: file.duration.unwrap_or_default(),
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.store.create(&record) {
            self.discard(vec![record.video_file, record.thumbnail]).await;
            return Err(e);
        }

        info!(video = %record.id, owner = %actor, "video published");
        Ok(record)
    }

    /// Fetch a video card, counting the fetch as a view
    ///
    /// Unpublished videos are readable by id too; only listings hide them.
    pub fn get_video_by_id(&self, id: &str) -> Result<VideoCard> {
        let id = parse_id("video", id)?;
        let viewed = self.store.update(Collection::Videos, &id, &Patch::new().increment("views", 1))?;
        if viewed.is_none() {
            return Err(Error::not_found(format!("video {id}")));
        }

        let plan = card_query(Filter::eq(ID_FIELD, id)).build();
        let row = self
            .store
            .query_one(&plan)?
            .ok_or_else(|| Error::not_found(format!("video {id}")))?;
        serde_json::from_value(row).map_err(|e| StoreError::from(e).into())
    }

    /// Change title, description or thumbnail; the old thumbnail is discarded afterwards
    pub async fn update_video(&self, actor: &UserId, id: &str, update: VideoUpdate) -> Result<Video> {
        let id = parse_id("video", id)?;
        let payload = validate_update(&update);

        let current: Video = self.load(&id)?;
        authorize_owner(&current, actor, "video")?;
        let (title, description) = payload?;

        let mut patch = Patch::new();
        if let Some(title) = title {
            patch = patch.set("title", title);
        }
        if let Some(description) = description {
            patch = patch.set("description", description);
        }
        let new_thumbnail = match update.thumbnail {
            Some(bytes) => {
                let stored = self.upload(MediaUpload::image(bytes)).await?;
                patch = patch.set("thumbnail", stored.locator.as_str());
                Some(stored.locator)
            }
            None => None,
        };
        patch = patch.set(UPDATED_AT_FIELD, current_timestamp());

        let updated = match self.store.patch::<Video>(&id, &patch) {
            Ok(Some((video, _))) => video,
            outcome => {
                self.discard(new_thumbnail.into_iter().collect()).await;
                return Err(outcome.err().unwrap_or_else(|| Error::not_found(format!("video {id}"))));
            }
        };

        if new_thumbnail.is_some() && current.thumbnail != updated.thumbnail {
            self.discard(vec![current.thumbnail]).await;
        }
        debug!(video = %id, "video updated");
        Ok(updated)
    }

    /// Delete a video with its comments, likes, playlist entries and media
    pub async fn delete_video(&self, actor: &UserId, id: &str) -> Result<Video> {
        let id = parse_id("video", id)?;
        let video: Video = self.load(&id)?;
        authorize_owner(&video, actor, "video")?;

        self.cascade.delete(CascadeTarget::Video(id)).await?;
        Ok(video)
    }

    /// Flip whether a video appears in public listings
    pub fn toggle_publish_status(&self, actor: &UserId, id: &str) -> Result<Video> {
        let id = parse_id("video", id)?;
        let video: Video = self.load(&id)?;
        authorize_owner(&video, actor, "video")?;

        let patch = Patch::new().toggle("isPublished").set(UPDATED_AT_FIELD, current_timestamp());
        let (video, _) = self
            .store
            .patch::<Video>(&id, &patch)?
            .ok_or_else(|| Error::not_found(format!("video {id}")))?;
        debug!(video = %id, published = video.is_published, "publish status toggled");
        Ok(video)
    }
}

fn validate_update(update: &VideoUpdate) -> Result<(Option<String>, Option<String>)> {
    if update.title.is_none() && update.description.is_none() && update.thumbnail.is_none() {
        return Err(Error::invalid_argument("nothing to update"));
    }
    if update.thumbnail.as_ref().is_some_and(Bytes::is_empty) {
        return Err(Error::invalid_argument("thumbnail file is empty"));
    }
    Ok((
        optional_text("title", update.title.as_deref())?,
        optional_text("description", update.description.as_deref())?,
    ))
}
