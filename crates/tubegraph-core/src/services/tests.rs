use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;
use crate::cascade::{MemJournal, ReconciliationLog};
use crate::media::MemMediaStore;
use crate::services::{Platform, PlaylistUpdate, VideoListing, VideoUpdate};
use crate::storage::{EntityStore, MemStore, TypedStore};
use crate::types::{Collection, ErrorKind, User, Video, ID16};
use crate::view::{Filter, Page};

struct Harness {
    platform: Platform<MemStore>,
    media: Arc<MemMediaStore>,
    journal: Arc<MemJournal>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemStore::new());
        let media = Arc::new(MemMediaStore::with_duration(30.0));
        let journal = Arc::new(MemJournal::new());
        let platform = Platform::new(store, media.clone(), journal.clone(), Duration::from_secs(2));
        Self { platform, media, journal }
    }

    fn user(&self, name: &str) -> User {
        let user = User::new(name, name.to_uppercase(), format!("avatar://{name}"));
        self.platform.store().create(&user).unwrap();
        user
    }

    async fn video(&self, owner: &User, title: &str) -> Video {
        self.platform
            .publish_video(&owner.id, title, "about it", Bytes::from_static(b"frames"), Bytes::from_static(b"jpg"))
            .await
            .unwrap()
    }
}

fn id(id: ID16) -> String {
    id.to_string()
}

#[tokio::test]
async fn test_like_toggle_twice_restores_state() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "first").await;

    assert!(h.platform.toggle_video_like(&bo.id, &id(video.id)).unwrap().edge_now_exists);
    assert_eq!(h.platform.get_video_by_id(&id(video.id)).unwrap().likes_count, 1);

    assert!(!h.platform.toggle_video_like(&bo.id, &id(video.id)).unwrap().edge_now_exists);
    assert_eq!(h.platform.get_video_by_id(&id(video.id)).unwrap().likes_count, 0);
}

#[tokio::test]
async fn test_list_videos_coerces_bad_paging() {
    let h = Harness::new();
    let ana = h.user("ana");
    for i in 0..12 {
        h.video(&ana, &format!("clip {i}")).await;
    }

    let listing = VideoListing { page: Page::new(0, -5), ..Default::default() };
    assert_eq!(h.platform.list_videos(&listing).unwrap().len(), 10);

    let second = VideoListing { page: Page::from_raw(Some("2"), Some("abc")), ..Default::default() };
    assert_eq!(h.platform.list_videos(&second).unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_comment_by_non_owner_is_unauthorized() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "clip").await;
    let comment = h.platform.add_comment(&ana.id, &id(video.id), "nice").unwrap();

    let err = h.platform.update_comment(&bo.id, &id(comment.id), "edited").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    // Payload problems do not leak past the ownership check
    let err = h.platform.update_comment(&bo.id, &id(comment.id), "   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h.platform.update_comment(&ana.id, &id(comment.id), "   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = h.platform.update_comment(&bo.id, &id(ID16::random()), "edited").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let updated = h.platform.update_comment(&ana.id, &id(comment.id), " edited ").unwrap();
    assert_eq!(updated.content, "edited");
}

#[tokio::test]
async fn test_delete_video_removes_comments_and_likes() {
    let h = Harness::new();
    let ana = h.user("ana");
    let video = h.video(&ana, "doomed").await;
    let keeper = h.video(&ana, "keeper").await;

    let fans: Vec<User> = (0..5).map(|i| h.user(&format!("fan{i}"))).collect();
    let mut comments = Vec::new();
    for fan in &fans[..3] {
        comments.push(h.platform.add_comment(&fan.id, &id(video.id), "first!").unwrap());
    }
    for fan in &fans {
        h.platform.toggle_video_like(&fan.id, &id(video.id)).unwrap();
    }
    h.platform.toggle_comment_like(&ana.id, &id(comments[0].id)).unwrap();
    h.platform.toggle_video_like(&ana.id, &id(keeper.id)).unwrap();

    h.platform.delete_video(&ana.id, &id(video.id)).await.unwrap();

    assert!(h.platform.get_video_comments(&id(video.id), Page::default()).unwrap().is_empty());
    let store = h.platform.store();
    assert_eq!(store.count(Collection::Comments, &Filter::All).unwrap(), 0);
    assert_eq!(store.count(Collection::Likes, &Filter::eq("target.id", video.id)).unwrap(), 0);
    assert_eq!(store.count(Collection::Likes, &Filter::eq("target.type", "comment")).unwrap(), 0);
    assert_eq!(store.count(Collection::Likes, &Filter::All).unwrap(), 1);

    // Media of the deleted video is gone, the other video's is kept
    assert_eq!(h.media.len(), 2);
    assert!(h.journal.pending().unwrap().is_empty());

    let err = h.platform.delete_video(&ana.id, &id(video.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.platform.get_video_by_id(&id(video.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_playlist_requires_name() {
    let h = Harness::new();
    let ana = h.user("ana");

    let err = h.platform.create_playlist(&ana.id, "", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let playlist = h.platform.create_playlist(&ana.id, "Later", "").unwrap();
    assert_eq!(playlist.description, "");
    assert!(playlist.videos.is_empty());
}

#[tokio::test]
async fn test_get_playlist_by_id_is_owner_gated() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let playlist = h.platform.create_playlist(&ana.id, "Mine", "private").unwrap();

    let err = h.platform.get_playlist_by_id(&bo.id, &id(playlist.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h.platform.get_playlist_by_id(&bo.id, "not-an-id").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let view = h.platform.get_playlist_by_id(&ana.id, &id(playlist.id)).unwrap();
    assert_eq!(view.name, "Mine");
}

#[tokio::test]
async fn test_playlist_membership_rules() {
    let h = Harness::new();
    let ana = h.user("ana");
    let first = h.video(&ana, "one").await;
    let second = h.video(&ana, "two").await;
    let playlist = h.platform.create_playlist(&ana.id, "Mix", "").unwrap();
    let pid = id(playlist.id);

    h.platform.add_video_to_playlist(&ana.id, &pid, &id(second.id)).unwrap();
    h.platform.add_video_to_playlist(&ana.id, &pid, &id(first.id)).unwrap();

    let err = h.platform.add_video_to_playlist(&ana.id, &pid, &id(first.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = h.platform.add_video_to_playlist(&ana.id, &pid, &id(ID16::random())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Insertion order is kept
    let view = h.platform.get_playlist_by_id(&ana.id, &pid).unwrap();
    let titles: Vec<&str> = view.videos.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, vec!["two", "one"]);

    h.platform.delete_video(&ana.id, &id(second.id)).await.unwrap();
    let view = h.platform.get_playlist_by_id(&ana.id, &pid).unwrap();
    assert_eq!(view.videos.len(), 1);
    let stored: crate::types::Playlist = h.platform.store().find(&playlist.id).unwrap().unwrap();
    assert_eq!(stored.videos, vec![first.id]);

    h.platform.remove_video_from_playlist(&ana.id, &pid, &id(first.id)).unwrap();
    let err = h.platform.remove_video_from_playlist(&ana.id, &pid, &id(first.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_add_to_foreign_playlist_is_unauthorized_before_video_lookup() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "one").await;
    let playlist = h.platform.create_playlist(&ana.id, "Mine", "").unwrap();
    let pid = id(playlist.id);

    let err = h.platform.add_video_to_playlist(&bo.id, &pid, &id(ID16::random())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = h.platform.add_video_to_playlist(&bo.id, &pid, &id(video.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = h.platform.add_video_to_playlist(&bo.id, &id(ID16::random()), &id(video.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.platform.add_video_to_playlist(&bo.id, &pid, "not-an-id").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let stored: crate::types::Playlist = h.platform.store().find(&playlist.id).unwrap().unwrap();
    assert!(stored.videos.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_playlist() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let playlist = h.platform.create_playlist(&ana.id, "Old", "d").unwrap();
    let pid = id(playlist.id);

    let blank = PlaylistUpdate { name: Some(" ".into()), description: None };
    let err = h.platform.update_playlist(&bo.id, &pid, blank.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = h.platform.update_playlist(&ana.id, &pid, blank).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = h.platform.update_playlist(&ana.id, &pid, PlaylistUpdate::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let renamed = h
        .platform
        .update_playlist(&ana.id, &pid, PlaylistUpdate { name: Some("New".into()), description: Some(String::new()) })
        .unwrap();
    assert_eq!(renamed.name, "New");
    assert_eq!(renamed.description, "");

    let err = h.platform.delete_playlist(&bo.id, &pid).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    h.platform.delete_playlist(&ana.id, &pid).await.unwrap();
    let err = h.platform.delete_playlist(&ana.id, &pid).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_listing_filters_sorts_and_hides_unpublished() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let rust = h.video(&ana, "Rust ownership").await;
    let draft = h.video(&ana, "Rust draft").await;
    h.video(&bo, "Cooking pasta").await;

    h.platform.toggle_publish_status(&ana.id, &id(draft.id)).unwrap();
    for _ in 0..3 {
        h.platform.get_video_by_id(&id(rust.id)).unwrap();
    }

    let search = VideoListing { query: Some("rust".into()), ..Default::default() };
    let found = h.platform.list_videos(&search).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, rust.id);
    assert_eq!(found[0].views, 3);
    assert_eq!(found[0].owner.as_ref().unwrap().username, "ana");

    let by_views = VideoListing {
        sort_by: Some("views".into()),
        sort_type: Some("asc".into()),
        ..Default::default()
    };
    let titles: Vec<String> = h.platform.list_videos(&by_views).unwrap().into_iter().map(|v| v.title).collect();
    assert_eq!(titles, vec!["Cooking pasta", "Rust ownership"]);

    let only_bo = VideoListing { user_id: Some(id(bo.id)), ..Default::default() };
    assert_eq!(h.platform.list_videos(&only_bo).unwrap().len(), 1);

    let bad_sort = VideoListing { sort_by: Some("password".into()), ..Default::default() };
    assert_eq!(h.platform.list_videos(&bad_sort).unwrap_err().kind(), ErrorKind::InvalidArgument);
    let bad_user = VideoListing { user_id: Some("nope".into()), ..Default::default() };
    assert_eq!(h.platform.list_videos(&bad_user).unwrap_err().kind(), ErrorKind::InvalidArgument);

    // The owner's dashboard still shows the draft
    assert_eq!(h.platform.get_channel_videos(&id(ana.id), Page::default()).unwrap().len(), 2);
}

#[tokio::test]
async fn test_toggle_publish_status_is_owner_only() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "clip").await;

    let err = h.platform.toggle_publish_status(&bo.id, &id(video.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert!(!h.platform.toggle_publish_status(&ana.id, &id(video.id)).unwrap().is_published);

    // Hidden from listings, still reachable by id
    assert!(h.platform.list_videos(&VideoListing::default()).unwrap().is_empty());
    let card = h.platform.get_video_by_id(&id(video.id)).unwrap();
    assert!(!card.is_published);
    assert_eq!(card.views, 1);

    assert!(h.platform.toggle_publish_status(&ana.id, &id(video.id)).unwrap().is_published);
}

#[tokio::test]
async fn test_update_video_swaps_thumbnail() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "clip").await;

    let err = h
        .platform
        .update_video(&bo.id, &id(video.id), VideoUpdate { title: Some(String::new()), ..Default::default() })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let update = VideoUpdate {
        title: Some("Better title".into()),
        thumbnail: Some(Bytes::from_static(b"png")),
        ..Default::default()
    };
    let updated = h.platform.update_video(&ana.id, &id(video.id), update).await.unwrap();

    assert_eq!(updated.title, "Better title");
    assert_eq!(updated.description, video.description);
    assert_ne!(updated.thumbnail, video.thumbnail);
    assert!(h.media.contains(&updated.thumbnail));
    assert!(!h.media.contains(&video.thumbnail));
    assert_eq!(h.media.len(), 2);
}

#[tokio::test]
async fn test_publish_video_validates_and_reports_media_failures() {
    let h = Harness::new();
    let ana = h.user("ana");

    let err = h
        .platform
        .publish_video(&ana.id, " ", "d", Bytes::from_static(b"v"), Bytes::from_static(b"t"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = h
        .platform
        .publish_video(&ana.id, "t", "d", Bytes::new(), Bytes::from_static(b"t"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    h.media.fail_stores(true);
    let err = h
        .platform
        .publish_video(&ana.id, "t", "d", Bytes::from_static(b"v"), Bytes::from_static(b"t"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(h.media.is_empty());
    assert_eq!(h.platform.store().count(Collection::Videos, &Filter::All).unwrap(), 0);

    h.media.fail_stores(false);
    let video = h.video(&ana, "ok").await;
    assert_eq!(video.duration, 30.0);
    assert!(video.is_published);
}

#[tokio::test]
async fn test_failed_media_delete_is_reported_then_reconciled() {
    let h = Harness::new();
    let ana = h.user("ana");
    let video = h.video(&ana, "clip").await;

    h.media.fail_deletes(true);
    let err = h.platform.delete_video(&ana.id, &id(video.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.journal.pending().unwrap().len(), 1);

    h.media.fail_deletes(false);
    let report = h.platform.cascade().reconcile().await.unwrap();
    assert_eq!(report.resolved, 1);
    assert!(h.media.is_empty());
    assert!(h.journal.pending().unwrap().is_empty());
}

#[tokio::test]
async fn test_posts_lifecycle() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");

    assert_eq!(h.platform.create_post(&ana.id, "").unwrap_err().kind(), ErrorKind::InvalidArgument);
    let post = h.platform.create_post(&ana.id, "hello world").unwrap();
    h.platform.toggle_post_like(&bo.id, &id(post.id)).unwrap();

    let posts = h.platform.get_user_posts(&id(ana.id), Page::default()).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes_count, 1);
    assert!(h.platform.get_user_posts(&id(bo.id), Page::default()).unwrap().is_empty());
    assert_eq!(
        h.platform.get_user_posts(&id(ID16::random()), Page::default()).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let err = h.platform.update_post(&bo.id, &id(post.id), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(h.platform.update_post(&ana.id, &id(post.id), "edited").unwrap().content, "edited");

    let err = h.platform.delete_post(&bo.id, &id(post.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    h.platform.delete_post(&ana.id, &id(post.id)).await.unwrap();
    assert_eq!(h.platform.store().count(Collection::Likes, &Filter::All).unwrap(), 0);
    let err = h.platform.delete_post(&ana.id, &id(post.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_comments_view_and_delete() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "clip").await;

    let err = h.platform.add_comment(&bo.id, &id(ID16::random()), "hi").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.platform.add_comment(&bo.id, &id(video.id), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let comment = h.platform.add_comment(&bo.id, &id(video.id), "hi").unwrap();
    h.platform.toggle_comment_like(&ana.id, &id(comment.id)).unwrap();

    let comments = h.platform.get_video_comments(&id(video.id), Page::default()).unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].likes_count, 1);
    assert_eq!(comments[0].owner.as_ref().unwrap().username, "bo");

    assert!(h.platform.get_video_comments(&id(ID16::random()), Page::default()).unwrap().is_empty());

    let err = h.platform.delete_comment(&ana.id, &id(comment.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    h.platform.delete_comment(&bo.id, &id(comment.id)).await.unwrap();
    assert_eq!(h.platform.store().count(Collection::Likes, &Filter::All).unwrap(), 0);
}

#[tokio::test]
async fn test_liked_videos_follow_live_edges() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let video = h.video(&ana, "clip").await;

    assert!(h.platform.get_liked_videos(&bo.id, Page::default()).unwrap().is_empty());

    h.platform.toggle_video_like(&bo.id, &id(video.id)).unwrap();
    let liked = h.platform.get_liked_videos(&bo.id, Page::default()).unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].video.id, video.id);
    assert_eq!(liked[0].video.owner, ana.id);

    h.platform.delete_video(&ana.id, &id(video.id)).await.unwrap();
    assert!(h.platform.get_liked_videos(&bo.id, Page::default()).unwrap().is_empty());

    let err = h.platform.toggle_video_like(&bo.id, &id(video.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_subscriptions_and_channel_stats() {
    let h = Harness::new();
    let ana = h.user("ana");
    let bo = h.user("bo");
    let cy = h.user("cy");
    let first = h.video(&ana, "one").await;
    let second = h.video(&ana, "two").await;

    let err = h.platform.toggle_subscription(&ana.id, &id(ana.id)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = h.platform.toggle_subscription(&ana.id, &id(ID16::random())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    h.platform.toggle_subscription(&bo.id, &id(ana.id)).unwrap();
    h.platform.toggle_subscription(&cy.id, &id(ana.id)).unwrap();
    h.platform.toggle_subscription(&cy.id, &id(bo.id)).unwrap();
    h.platform.toggle_video_like(&bo.id, &id(first.id)).unwrap();
    h.platform.toggle_video_like(&cy.id, &id(first.id)).unwrap();
    h.platform.toggle_video_like(&cy.id, &id(second.id)).unwrap();
    h.platform.get_video_by_id(&id(second.id)).unwrap();

    let subscribers = h.platform.get_channel_subscribers(&id(ana.id), Page::default()).unwrap();
    let mut names: Vec<String> = subscribers.into_iter().map(|s| s.subscriber.username).collect();
    names.sort();
    assert_eq!(names, vec!["bo", "cy"]);

    let channels = h.platform.get_subscribed_channels(&id(cy.id), Page::default()).unwrap();
    assert_eq!(channels.len(), 2);
    let ana_channel = channels.iter().find(|c| c.channel.id == ana.id).unwrap();
    assert_eq!(ana_channel.subscribers_count, 2);

    let stats = h.platform.get_channel_stats(&id(ana.id)).unwrap();
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.total_views, 1);
    assert_eq!(stats.total_subscribers, 2);
    assert_eq!(stats.total_likes, 3);

    // Unsubscribing is reflected immediately
    h.platform.toggle_subscription(&bo.id, &id(ana.id)).unwrap();
    assert_eq!(h.platform.get_channel_stats(&id(ana.id)).unwrap().total_subscribers, 1);

    let err = h.platform.get_channel_stats("???").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
