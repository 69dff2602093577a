/// Type definitions for tubegraph
///
/// This module contains all type definitions organized by category.

/// Identifier types
pub mod ids;
/// Primary entities
pub mod entities;
/// Like and subscription edges
pub mod edge;
/// System-wide error types
pub mod error;

use serde::{Deserialize, Serialize};

/// Identifier of a user (also the identifier of the user's channel)
pub type UserId = ids::ID16;

/// Identifier of a video
pub type VideoId = ids::ID16;

/// Identifier of a comment
pub type CommentId = ids::ID16;

/// Identifier of a short post
pub type PostId = ids::ID16;

/// Identifier of a playlist
pub type PlaylistId = ids::ID16;

/// Identifier of a like or subscription edge
pub type EdgeId = ids::ID16;

// Re-export commonly used types for convenience
pub use ids::ID16;
pub use entities::{Comment, Owned, Playlist, Post, Record, User, Video};
pub use edge::{Edge, EdgeKey, EdgeKind, EdgeTarget, ToggleOutcome};
pub use error::{parse_id, Error, ErrorKind, MediaError, Result, StoreError};

/// Named set of rows in the entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// User profiles
    Users,
    /// Videos
    Videos,
    /// Comments on videos
    Comments,
    /// Short posts
    Posts,
    /// Playlists
    Playlists,
    /// Like edges
    Likes,
    /// Subscription edges
    Subscriptions,
}

impl Collection {
    /// Collections holding entity rows (as opposed to edges)
    pub const ENTITIES: [Collection; 5] = [
        Collection::Users,
        Collection::Videos,
        Collection::Comments,
        Collection::Posts,
        Collection::Playlists,
    ];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Videos => "videos",
            Collection::Comments => "comments",
            Collection::Posts => "posts",
            Collection::Playlists => "playlists",
            Collection::Likes => "likes",
            Collection::Subscriptions => "subscriptions",
        }
    }

    /// Edge kind stored in this collection, if it is an edge collection
    pub fn edge_kind(&self) -> Option<EdgeKind> {
        match self {
            Collection::Likes => Some(EdgeKind::Like),
            Collection::Subscriptions => Some(EdgeKind::Subscription),
            _ => None,
        }
    }

    /// Singular noun used in error messages
    pub fn noun(&self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::Videos => "video",
            Collection::Comments => "comment",
            Collection::Posts => "post",
            Collection::Playlists => "playlist",
            Collection::Likes => "like",
            Collection::Subscriptions => "subscription",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get current timestamp in nanoseconds since Unix epoch
pub fn current_timestamp() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .map(|nanos| nanos.max(0) as u64)
        .unwrap_or_default()
}
