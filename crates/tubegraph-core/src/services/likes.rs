use crate::relation::toggle_edge;
use crate::services::Platform;
use crate::storage::EntityStore;
use crate::types::{parse_id, Collection, EdgeKind, EdgeTarget, Result, ToggleOutcome, UserId};
use crate::view::rows::{decode_rows, LikedVideo};
use crate::view::{Filter, Lookup, Page, ViewQuery};

/// Fields of a liked video shown in the liked-videos list
const LIKED_VIDEO_FIELDS: &[&str] =
    &["_id", "title", "description", "thumbnail", "videoFile", "duration", "views", "owner"];

impl<S: EntityStore> Platform<S> {
    /// Like or unlike a video
    pub fn toggle_video_like(&self, actor: &UserId, video: &str) -> Result<ToggleOutcome> {
        let target = EdgeTarget::Video(parse_id("video", video)?);
        toggle_edge(self.store.as_ref(), *actor, target, EdgeKind::Like)
    }

    /// Like or unlike a comment
    pub fn toggle_comment_like(&self, actor: &UserId, comment: &str) -> Result<ToggleOutcome> {
        let target = EdgeTarget::Comment(parse_id("comment", comment)?);
        toggle_edge(self.store.as_ref(), *actor, target, EdgeKind::Like)
    }

    /// Like or unlike a post
    pub fn toggle_post_like(&self, actor: &UserId, post: &str) -> Result<ToggleOutcome> {
        let target = EdgeTarget::Post(parse_id("post", post)?);
        toggle_edge(self.store.as_ref(), *actor, target, EdgeKind::Like)
    }

    /// Videos the actor liked, most recent like first
    ///
    /// Likes whose video has since disappeared are left out.
    pub fn get_liked_videos(&self, actor: &UserId, page: Page) -> Result<Vec<LikedVideo>> {
        let plan = ViewQuery::from(Collection::Likes)
            .filter(Filter::eq("actor", *actor).and(Filter::eq("target.type", "video")))
            .join(Lookup::one(Collection::Videos, "target.id", "video").project(LIKED_VIDEO_FIELDS).required())
            .page(page)
            .build();
        decode_rows(self.store.query(&plan)?)
    }
}
