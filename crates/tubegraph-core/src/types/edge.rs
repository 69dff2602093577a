//! Like and subscription edges.
//!
//! An edge connects an actor to exactly one target. The target is an explicit
//! tagged union, so the kind of entity a like points at is never inferred from
//! which optional field happens to be populated.

use serde::{Deserialize, Serialize};
use crate::types::{current_timestamp, Collection, CommentId, EdgeId, PostId, UserId, VideoId, ID16};

/// Relation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Actor likes a video, comment or post
    Like,
    /// Actor subscribes to a channel
    Subscription,
}

impl EdgeKind {
    /// Collection the edges of this kind are exposed as
    pub fn collection(self) -> Collection {
        match self {
            EdgeKind::Like => Collection::Likes,
            EdgeKind::Subscription => Collection::Subscriptions,
        }
    }
}

/// Target of an edge, carrying exactly one identifier
///
/// Serialized as `{"type": "video", "id": "..."}` so views can address the
/// identifier as `target.id` and the kind as `target.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum EdgeTarget {
    /// A video
    Video(VideoId),
    /// A comment
    Comment(CommentId),
    /// A short post
    Post(PostId),
    /// A channel, i.e. a user
    Channel(UserId),
}

impl EdgeTarget {
    /// The only edge kind this target may carry
    pub fn edge_kind(&self) -> EdgeKind {
        match self {
            EdgeTarget::Channel(_) => EdgeKind::Subscription,
            _ => EdgeKind::Like,
        }
    }

    /// Identifier of the targeted entity
    pub fn id(&self) -> ID16 {
        match *self {
            EdgeTarget::Video(id)
            | EdgeTarget::Comment(id)
            | EdgeTarget::Post(id)
            | EdgeTarget::Channel(id) => id,
        }
    }

    /// Collection holding the targeted entity
    pub fn collection(&self) -> Collection {
        match self {
            EdgeTarget::Video(_) => Collection::Videos,
            EdgeTarget::Comment(_) => Collection::Comments,
            EdgeTarget::Post(_) => Collection::Posts,
            EdgeTarget::Channel(_) => Collection::Users,
        }
    }

    /// Value of `target.type` for this target
    pub fn type_name(&self) -> &'static str {
        match self {
            EdgeTarget::Video(_) => "video",
            EdgeTarget::Comment(_) => "comment",
            EdgeTarget::Post(_) => "post",
            EdgeTarget::Channel(_) => "channel",
        }
    }
}

/// Uniqueness key of an edge: at most one edge per (actor, target, kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Acting user
    pub actor: UserId,
    /// Target
    pub target: EdgeTarget,
    /// Kind
    pub kind: EdgeKind,
}

/// Stored relation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: EdgeId,
    /// Acting user
    pub actor: UserId,
    /// Target
    pub target: EdgeTarget,
    /// Kind
    pub kind: EdgeKind,
    /// Creation time in nanoseconds
    pub created_at: u64,
}

impl Edge {
    /// Create a fresh edge
    pub fn new(actor: UserId, target: EdgeTarget, kind: EdgeKind) -> Self {
        Self {
            id: ID16::random(),
            actor,
            target,
            kind,
            created_at: current_timestamp(),
        }
    }

    /// Uniqueness key of this edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            actor: self.actor,
            target: self.target,
            kind: self.kind,
        }
    }
}

/// Outcome of an atomic toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// Whether the edge exists after the toggle
    pub edge_now_exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_serializes_as_tagged_pair() {
        let id = ID16::random();
        let doc = serde_json::to_value(EdgeTarget::Comment(id)).unwrap();
        assert_eq!(doc, serde_json::json!({"type": "comment", "id": id.to_string()}));
        assert_eq!(EdgeTarget::Comment(id).type_name(), "comment");
    }

    #[test]
    fn test_target_kind_consistency() {
        let id = ID16::random();
        assert_eq!(EdgeTarget::Video(id).edge_kind(), EdgeKind::Like);
        assert_eq!(EdgeTarget::Post(id).edge_kind(), EdgeKind::Like);
        assert_eq!(EdgeTarget::Channel(id).edge_kind(), EdgeKind::Subscription);
        assert_eq!(EdgeTarget::Channel(id).collection(), Collection::Users);
    }
}
