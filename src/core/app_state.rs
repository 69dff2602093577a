//! Application state
//!
//! Holds the platform together with the configuration it was built from.

use std::sync::Arc;
use tubegraph_core::{MemStore, Platform};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::storage::snapshot;

/// Central application state
pub struct AppState {
    /// Platform operations over the in-memory store
    pub platform: Platform<MemStore>,

    /// Shared handle to the store, kept for snapshots
    pub store: Arc<MemStore>,

    /// Application configuration
    pub config: Config,
}

impl AppState {
    /// Write a snapshot when the configuration asks for one
    pub fn persist(&self) -> Result<bool> {
        if !self.config.storage.snapshot_on_exit {
            return Ok(false);
        }
        snapshot::save(&self.store, &self.config.snapshot_path())?;
        Ok(true)
    }
}
