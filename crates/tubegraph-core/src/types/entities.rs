//! Primary entities stored by the platform.
//!
//! All entities serialize with camelCase field names and keep their identifier
//! under `_id`, which is the shape the view composer joins and sorts on.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::types::{current_timestamp, Collection, CommentId, PlaylistId, PostId, UserId, VideoId, ID16};

/// A stored row with a known collection and identifier
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the record lives in
    const COLLECTION: Collection;

    /// Identifier of this record
    fn id(&self) -> ID16;
}

/// A record with an immutable owner
pub trait Owned {
    /// Owner of the record
    fn owner(&self) -> UserId;
}

/// User profile. Read-only from the core's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier (also the channel identifier)
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Unique handle
    pub username: String,
    /// Display name
    pub fullname: String,
    /// Avatar locator
    pub avatar: String,
    /// Creation time in nanoseconds
    pub created_at: u64,
}

impl User {
    /// Create a user with a fresh identifier
    pub fn new(username: impl Into<String>, fullname: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: ID16::random(),
            username: username.into(),
            fullname: fullname.into(),
            avatar: avatar.into(),
            created_at: current_timestamp(),
        }
    }
}

/// Uploaded video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: VideoId,
    /// Uploading user
    pub owner: UserId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Media locator of the video file
    pub video_file: String,
    /// Media locator of the thumbnail
    pub thumbnail: String,
    /// Duration in seconds as reported by the media store
    pub duration: f64,
    /// Number of times the video was fetched
    pub views: u64,
    /// Whether the video appears in public listings
    pub is_published: bool,
    /// Creation time in nanoseconds
    pub created_at: u64,
    /// Last mutation time in nanoseconds
    pub updated_at: u64,
}

/// Comment on a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: CommentId,
    /// Author
    pub owner: UserId,
    /// Parent video
    pub video: VideoId,
    /// Text
    pub content: String,
    /// Creation time in nanoseconds
    pub created_at: u64,
    /// Last mutation time in nanoseconds
    pub updated_at: u64,
}

/// Short text post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: PostId,
    /// Author
    pub owner: UserId,
    /// Text
    pub content: String,
    /// Creation time in nanoseconds
    pub created_at: u64,
    /// Last mutation time in nanoseconds
    pub updated_at: u64,
}

/// Ordered, duplicate-free collection of videos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    /// Creator
    pub owner: UserId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Videos in insertion order
    pub videos: Vec<VideoId>,
    /// Creation time in nanoseconds
    pub created_at: u64,
    /// Last mutation time in nanoseconds
    pub updated_at: u64,
}

macro_rules! impl_record {
    ($ty:ty, $collection:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> ID16 {
                self.id
            }
        }
    };
}

macro_rules! impl_owned {
    ($($ty:ty),*) => {
        $(impl Owned for $ty {
            fn owner(&self) -> UserId {
                self.owner
            }
        })*
    };
}

impl_record!(User, Collection::Users);
impl_record!(Video, Collection::Videos);
impl_record!(Comment, Collection::Comments);
impl_record!(Post, Collection::Posts);
impl_record!(Playlist, Collection::Playlists);
impl_owned!(Video, Comment, Post, Playlist);
