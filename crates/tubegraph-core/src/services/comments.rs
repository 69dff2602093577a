use tracing::debug;
use crate::cascade::CascadeTarget;
use crate::constants::UPDATED_AT_FIELD;
use crate::guard::authorize_owner;
use crate::services::{required_text, Platform};
use crate::storage::{EntityStore, Patch, TypedStore};
use crate::types::{current_timestamp, parse_id, Collection, Comment, Error, Result, UserId, Video, ID16};
use crate::view::rows::{decode_rows, CommentView};
use crate::view::{CountJoin, Filter, Lookup, Page, ViewQuery};

impl<S: EntityStore> Platform<S> {
    /// Comments on a video, newest first
    ///
    /// A video that does not exist (or was deleted with its comments) simply
    /// has no comments.
    pub fn get_video_comments(&self, video: &str, page: Page) -> Result<Vec<CommentView>> {
        let video = parse_id("video", video)?;
        let plan = ViewQuery::from(Collection::Comments)
            .filter(Filter::eq("video", video))
            .join(Lookup::profile("owner", "owner"))
            .count(CountJoin::likes("comment", "likesCount"))
            .page(page)
            .build();
        decode_rows(self.store.query(&plan)?)
    }

    /// Comment on an existing video
    pub fn add_comment(&self, actor: &UserId, video: &str, content: &str) -> Result<Comment> {
        let video = parse_id("video", video)?;
        let content = required_text("content", content)?;
        self.load::<Video>(&video)?;

        let now = current_timestamp();
        let comment = Comment {
            id: ID16::random(),
            owner: *actor,
            video,
            content,
            created_at: now,
            updated_at: now,
        };
        self.store.create(&comment)?;
        debug!(comment = %comment.id, %video, "comment added");
        Ok(comment)
    }

    /// Replace the text of one's own comment
    pub fn update_comment(&self, actor: &UserId, id: &str, content: &str) -> Result<Comment> {
        let id = parse_id("comment", id)?;
        let content = required_text("content", content);

        let comment: Comment = self.load(&id)?;
        authorize_owner(&comment, actor, "comment")?;
        let content = content?;

        let patch = Patch::new().set("content", content).set(UPDATED_AT_FIELD, current_timestamp());
        let (comment, _) = self
            .store
            .patch::<Comment>(&id, &patch)?
            .ok_or_else(|| Error::not_found(format!("comment {id}")))?;
        Ok(comment)
    }

    /// Delete one's own comment together with its likes
    pub async fn delete_comment(&self, actor: &UserId, id: &str) -> Result<Comment> {
        let id = parse_id("comment", id)?;
        let comment: Comment = self.load(&id)?;
        authorize_owner(&comment, actor, "comment")?;

        self.cascade.delete(CascadeTarget::Comment(id)).await?;
        Ok(comment)
    }
}
