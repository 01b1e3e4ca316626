//! Append-only JSONL record store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use super::traits::RecordStore;
use crate::error::{StorageError, StorageResult};
use crate::record::MemoryRecord;

/// File-backed store writing one JSON document per line.
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Open a store at `path`, creating parent directories if needed.
    pub async fn new(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> StorageResult<Vec<MemoryRecord>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut records = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let record: MemoryRecord = serde_json::from_str(&line)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            records.push(record);
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn insert_record(&self, record: &MemoryRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn count_records(&self) -> StorageResult<usize> {
        Ok(self.read_all().await?.len())
    }

    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        let mut records = self.read_all().await?;
        let start = records.len().saturating_sub(limit);
        Ok(records.split_off(start))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
