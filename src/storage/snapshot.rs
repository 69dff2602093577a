//! MessagePack snapshots of the in-memory store

use std::path::Path;
use tracing::info;
use tubegraph_core::{MemStore, StoreSnapshot};
use crate::core::error::{Error, Result};

/// Write the store to `path`
///
/// The snapshot goes to a sibling temp file first and is renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
pub fn save(store: &MemStore, path: &Path) -> Result<()> {
    let snapshot = store.snapshot();
    let encoded = rmp_serde::to_vec_named(&snapshot)
        .map_err(|e| Error::snapshot(format!("Failed to encode snapshot: {}", e)))?;

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &encoded)?;
    std::fs::rename(&tmp, path)?;

    info!("Saved snapshot to {} ({} bytes)", path.display(), encoded.len());
    Ok(())
}

/// Read a store back from `path`, or `None` when no snapshot exists yet
pub fn load(path: &Path) -> Result<Option<MemStore>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = std::fs::read(path)?;
    let snapshot: StoreSnapshot = rmp_serde::from_slice(&bytes)
        .map_err(|e| Error::snapshot(format!("Failed to decode {}: {}", path.display(), e)))?;
    let store = MemStore::restore(snapshot)
        .map_err(|e| Error::snapshot(format!("Failed to restore {}: {}", path.display(), e)))?;

    info!("Loaded snapshot from {}", path.display());
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubegraph_core::{Collection, Edge, EdgeKind, EdgeTarget, EntityStore, TypedStore, User};

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("store.msgpack")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_keeps_rows_and_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.msgpack");

        let store = MemStore::new();
        let alice = User::new("alice", "Alice", "");
        let bob = User::new("bob", "Bob", "");
        store.create(&alice).unwrap();
        store.create(&bob).unwrap();
        store.toggle_edge(Edge::new(alice.id, EdgeTarget::Channel(bob.id), EdgeKind::Subscription)).unwrap();

        save(&store, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let restored = load(&path).unwrap().unwrap();
        assert_eq!(restored.len(Collection::Users), 2);
        assert_eq!(restored.len(Collection::Subscriptions), 1);
        assert_eq!(restored.find::<User>(&bob.id).unwrap(), Some(bob));
    }

    #[test]
    fn test_garbage_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.msgpack");
        std::fs::write(&path, b"not msgpack").unwrap();
        assert!(matches!(load(&path), Err(Error::Snapshot(_))));
    }
}
