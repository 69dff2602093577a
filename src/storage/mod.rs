//! Persistence adapters for the platform core
//!
//! The core keeps everything in memory behind traits. This module gives it a
//! disk: MessagePack snapshots of the entity store, a JSON-lines
//! reconciliation journal and a directory-backed media store.

pub mod file_journal;
pub mod local_media;
pub mod snapshot;

pub use file_journal::FileJournal;
pub use local_media::LocalMediaStore;
