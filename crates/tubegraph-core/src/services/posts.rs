use tracing::debug;
use crate::cascade::CascadeTarget;
use crate::constants::UPDATED_AT_FIELD;
use crate::guard::authorize_owner;
use crate::services::{required_text, Platform};
use crate::storage::{EntityStore, Patch, TypedStore};
use crate::types::{current_timestamp, parse_id, Collection, Error, Post, Result, UserId, ID16};
use crate::view::rows::{decode_rows, PostView};
use crate::view::{CountJoin, Filter, Lookup, Page, ViewQuery};

impl<S: EntityStore> Platform<S> {
    /// Publish a short text post
    pub fn create_post(&self, actor: &UserId, content: &str) -> Result<Post> {
        let content = required_text("content", content)?;

        let now = current_timestamp();
        let post = Post {
            id: ID16::random(),
            owner: *actor,
            content,
            created_at: now,
            updated_at: now,
        };
        self.store.create(&post)?;
        debug!(post = %post.id, owner = %actor, "post created");
        Ok(post)
    }

    /// Posts of an existing user, newest first
    pub fn get_user_posts(&self, user: &str, page: Page) -> Result<Vec<PostView>> {
        let user = self.existing_user("user", user)?;
        let plan = ViewQuery::from(Collection::Posts)
            .filter(Filter::eq("owner", user))
            .join(Lookup::profile("owner", "owner"))
            .count(CountJoin::likes("post", "likesCount"))
            .page(page)
            .build();
        decode_rows(self.store.query(&plan)?)
    }

    /// Replace the text of one's own post
    pub fn update_post(&self, actor: &UserId, id: &str, content: &str) -> Result<Post> {
        let id = parse_id("post", id)?;
        let content = required_text("content", content);

        let post: Post = self.load(&id)?;
        authorize_owner(&post, actor, "post")?;
        let content = content?;

        let patch = Patch::new().set("content", content).set(UPDATED_AT_FIELD, current_timestamp());
        let (post, _) = self
            .store
            .patch::<Post>(&id, &patch)?
            .ok_or_else(|| Error::not_found(format!("post {id}")))?;
        Ok(post)
    }

    /// Delete one's own post together with its likes
    pub async fn delete_post(&self, actor: &UserId, id: &str) -> Result<Post> {
        let id = parse_id("post", id)?;
        let post: Post = self.load(&id)?;
        authorize_owner(&post, actor, "post")?;

        self.cascade.delete(CascadeTarget::Post(id)).await?;
        Ok(post)
    }
}
