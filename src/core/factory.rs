//! Builds an [`AppState`] from configuration

use std::sync::Arc;
use tracing::info;
use tubegraph_core::{MemStore, Platform};
use crate::core::app_state::AppState;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::storage::{snapshot, FileJournal, LocalMediaStore};

/// Open every adapter named by `config` and assemble the platform
///
/// A missing snapshot starts an empty store. The journal is replayed on open,
/// so entries left by an earlier run are pending again.
pub async fn create_app_state(config: Config) -> Result<AppState> {
    let data_dir = &config.storage.data_dir;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| Error::config(format!("Cannot create data directory {:?}: {}", data_dir, e)))?;
        info!("Created data directory: {:?}", data_dir);
    }

    let store = match snapshot::load(&config.snapshot_path())? {
        Some(store) => Arc::new(store),
        None => {
            info!("No snapshot at {:?}, starting empty", config.snapshot_path());
            Arc::new(MemStore::new())
        }
    };

    let journal = Arc::new(FileJournal::open(config.journal_path())?);
    let media = LocalMediaStore::open(&config.media.root_dir)
        .await
        .map_err(|e| Error::config(format!("Cannot open media directory {:?}: {}", config.media.root_dir, e)))?;

    let platform = Platform::new(store.clone(), Arc::new(media), journal, config.media.timeout);
    Ok(AppState { platform, store, config })
}
