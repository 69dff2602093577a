//! Error types for the tubegraph binary crate
//!
//! Wraps the core error and adds the failures that only exist once the core
//! is attached to a filesystem: configuration, snapshots and the journal.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tubegraph binary crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store snapshot could not be written or read back
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Reconciliation journal could not be opened or replayed
    #[error("Journal error: {0}")]
    Journal(String),

    /// Errors raised by the platform core
    #[error(transparent)]
    Core(#[from] tubegraph_core::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a journal error
    pub fn journal(msg: impl Into<String>) -> Self {
        Self::Journal(msg.into())
    }
}
