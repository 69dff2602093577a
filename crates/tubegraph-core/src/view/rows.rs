//! Typed rows produced by the platform's views.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::types::{CommentId, PlaylistId, PostId, Result, StoreError, UserId, VideoId};

/// Public profile fields of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerProfile {
    /// User id
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Handle
    pub username: String,
    /// Display name
    pub fullname: String,
    /// Avatar locator
    pub avatar: String,
}

/// Video with owner profile and like count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    #[serde(rename = "_id")]
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub created_at: u64,
    /// `None` when the owner no longer exists
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
}

/// Comment with author profile and like count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub video: VideoId,
    pub content: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
}

/// Post with author profile and like count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub content: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
}

/// Video summary embedded in a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    #[serde(rename = "_id")]
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub duration: f64,
    pub views: u64,
}

/// Playlist with its videos resolved in playlist order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub videos: Vec<PlaylistVideo>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Video summary shown in the liked-videos list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoSummary {
    #[serde(rename = "_id")]
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub duration: f64,
    pub views: u64,
    pub owner: UserId,
}

/// A like on a video, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedVideo {
    /// When the like was created
    #[serde(rename = "createdAt")]
    pub liked_at: u64,
    /// The liked video
    pub video: LikedVideoSummary,
}

/// A subscriber of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberView {
    /// When the subscription was created
    #[serde(rename = "createdAt")]
    pub subscribed_at: u64,
    /// Subscriber profile
    pub subscriber: OwnerProfile,
}

/// A channel the user subscribes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    /// When the subscription was created
    #[serde(rename = "createdAt")]
    pub subscribed_at: u64,
    /// Channel profile
    pub channel: OwnerProfile,
    /// Current number of subscribers of that channel
    pub subscribers_count: u64,
}

/// Aggregate numbers for a channel dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    /// Channel
    pub channel: UserId,
    /// Videos uploaded, published or not
    pub total_videos: u64,
    /// Sum of views across those videos
    pub total_views: u64,
    /// Current subscribers
    pub total_subscribers: u64,
    /// Likes across those videos
    pub total_likes: u64,
}

/// Decode view rows into a typed row
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Serialization(e).into()))
        .collect()
}
