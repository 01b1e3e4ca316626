//! Dual-target snapshot committer.
//!
//! A commit serializes the full engine state once and writes the same bytes
//! to the primary and mirror targets. Each target is replaced through a
//! temp-file rename, so a single target is never torn. The two targets are
//! written independently: if one fails the other is still attempted, and the
//! commit reports failure even though one target may now be newer. Commits
//! are serialized, so concurrent callers never share a temp file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::collector::BufferEntry;
use crate::config::SnapshotTargets;
use crate::error::SnapshotError;
use crate::ledger::TagDistribution;
use crate::record::MemoryRecord;

/// The document written to each snapshot target.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDocument {
    pub timestamp: DateTime<Utc>,
    pub breath_cycle: u64,
    pub memory_lines: Vec<MemoryRecord>,
    pub collector_buffer: Vec<BufferEntry>,
    pub config: Value,
    pub context_window_usage: usize,
    pub semantic_state: TagDistribution,
}

/// Writes snapshot documents to two redundant locations.
#[derive(Debug)]
pub struct SnapshotCommitter {
    targets: SnapshotTargets,
    commit_lock: Mutex<()>,
}

impl SnapshotCommitter {
    pub fn new(targets: SnapshotTargets) -> Self {
        Self {
            targets,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn targets(&self) -> &SnapshotTargets {
        &self.targets
    }

    /// Write `document` to both targets. Returns `true` only if serialization
    /// and both writes succeeded.
    pub async fn commit(&self, document: &SnapshotDocument) -> bool {
        let bytes = match serde_json::to_vec_pretty(document) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(error = %SnapshotError::from(e), "Snapshot commit failed");
                return false;
            }
        };

        let _guard = self.commit_lock.lock().await;
        let mut committed = true;
        for path in self.targets.paths() {
            if let Err(e) = write_target(path, &bytes).await {
                error!(error = %e, "Snapshot commit failed");
                committed = false;
            }
        }

        if committed {
            info!(
                lines = document.memory_lines.len(),
                cycle = document.breath_cycle,
                "Memory snapshot committed"
            );
        }
        committed
    }
}

async fn write_target(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let fail = |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await.map_err(fail)?;
    tokio::fs::rename(&tmp, path).await.map_err(fail)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
