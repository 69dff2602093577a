//! Append-only reconciliation journal on disk
//!
//! One JSON object per line. `record` lines add entries, `resolve` lines mark
//! them done. Opening the file replays every line to rebuild the pending set
//! and compacts away whatever is no longer pending.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tubegraph_core::types::StoreError;
use tubegraph_core::{ReconciliationEntry, ReconciliationLog};
use uuid::Uuid;
use crate::core::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalLine {
    Record(ReconciliationEntry),
    Resolve { id: Uuid },
}

struct JournalState {
    file: File,
    pending: Vec<ReconciliationEntry>,
}

/// [`ReconciliationLog`] persisted as JSON lines
pub struct FileJournal {
    path: PathBuf,
    state: Mutex<JournalState>,
}

impl FileJournal {
    /// Open or create the journal at `path` and replay its contents
    ///
    /// When the file holds anything besides pending records (resolve markers,
    /// resolved records, an unreadable or torn line) it is compacted down to
    /// the pending records before new appends go to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut pending: Vec<ReconciliationEntry> = Vec::new();
        let mut lines = 0usize;

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::journal(format!("Failed to read {}: {}", path.display(), e)))?;
            // A missing final newline forces a rewrite so appends start on their own line
            if !contents.is_empty() && !contents.ends_with('\n') {
                lines += 1;
            }
            for (number, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                lines += 1;
                match serde_json::from_str::<JournalLine>(line) {
                    Ok(JournalLine::Record(entry)) => pending.push(entry),
                    Ok(JournalLine::Resolve { id }) => pending.retain(|e| e.id != id),
                    Err(e) => warn!("Skipping journal line {} in {}: {}", number + 1, path.display(), e),
                }
            }
        }

        if lines > pending.len() {
            Self::compact(&path, &pending)?;
            debug!("Compacted journal {} from {} lines to {}", path.display(), lines, pending.len());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::journal(format!("Failed to open {}: {}", path.display(), e)))?;

        debug!("Opened journal {} with {} pending entries", path.display(), pending.len());
        Ok(Self { path, state: Mutex::new(JournalState { file, pending }) })
    }

    /// Rewrite the journal with only `pending` records, via temp file and rename
    fn compact(path: &Path, pending: &[ReconciliationEntry]) -> Result<()> {
        let mut encoded = Vec::new();
        for entry in pending {
            let line = serde_json::to_vec(&JournalLine::Record(entry.clone()))
                .map_err(|e| Error::journal(format!("Failed to encode entry {}: {}", entry.id, e)))?;
            encoded.extend_from_slice(&line);
            encoded.push(b'\n');
        }

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &encoded)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Location of the journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(file: &mut File, line: &JournalLine) -> std::result::Result<(), StoreError> {
        let mut encoded = serde_json::to_vec(line)?;
        encoded.push(b'\n');
        file.write_all(&encoded)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| StoreError::Unavailable(format!("journal write failed: {}", e)))
    }
}

impl ReconciliationLog for FileJournal {
    fn record(&self, entry: &ReconciliationEntry) -> tubegraph_core::Result<()> {
        let mut state = self.state.lock();
        Self::append(&mut state.file, &JournalLine::Record(entry.clone()))?;
        state.pending.push(entry.clone());
        Ok(())
    }

    fn pending(&self) -> tubegraph_core::Result<Vec<ReconciliationEntry>> {
        Ok(self.state.lock().pending.clone())
    }

    fn resolve(&self, id: Uuid) -> tubegraph_core::Result<()> {
        let mut state = self.state.lock();
        if !state.pending.iter().any(|e| e.id == id) {
            return Ok(());
        }
        Self::append(&mut state.file, &JournalLine::Resolve { id })?;
        state.pending.retain(|e| e.id != id);
        Ok(())
    }
}
