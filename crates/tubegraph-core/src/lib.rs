//! # Tubegraph Core
//!
//! Relationship core of a video-sharing platform: likes and subscriptions as
//! atomically toggled edges, composable read views, ownership checks and
//! cascading deletes with reconciliation.
//! Storage and media are reached through traits; in-memory adapters are
//! included.

#![warn(missing_docs)]

/// System constants
pub mod constants;

/// Type definitions for all data structures
pub mod types;

/// Storage layer: entity store trait, patches and the in-memory store
pub mod storage;

/// Declarative read views
pub mod view;

/// Atomic like and subscription toggles
pub mod relation;

/// Ownership checks
pub mod guard;

/// External media store contract
pub mod media;

/// Cascading deletes and reconciliation
pub mod cascade;

/// Platform operations
pub mod services;

/// System utilities and metrics
pub mod system;

// Re-export commonly used items
pub use types::{Error, ErrorKind, Result, UserId, VideoId, ID16};
pub use types::{Collection, Comment, Edge, EdgeKind, EdgeTarget, Playlist, Post, User, Video};
pub use storage::{EntityStore, MemStore, StoreSnapshot, TypedStore};
pub use media::{MediaStore, MemMediaStore};
pub use cascade::{MemJournal, ReconciliationEntry, ReconciliationLog};
pub use services::Platform;
pub use view::Page;
