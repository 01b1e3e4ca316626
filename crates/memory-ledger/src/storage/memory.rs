//! In-memory storage implementation

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::RecordStore;
use crate::error::StorageResult;
use crate::record::MemoryRecord;

/// In-memory record store for development and testing
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record in insertion order.
    pub async fn records(&self) -> Vec<MemoryRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_record(&self, record: &MemoryRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(())
    }

    async fn count_records(&self) -> StorageResult<usize> {
        Ok(self.records.read().await.len())
    }

    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>> {
        let records = self.records.read().await;
        let start = records.len().saturating_sub(limit);
        Ok(records[start..].to_vec())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_list() {
        let store = InMemoryRecordStore::new();
        for stage in ["genesis", "awakening", "reflection"] {
            store
                .insert_record(&MemoryRecord::builder(stage).build())
                .await
                .unwrap();
        }

        assert_eq!(store.count_records().await.unwrap(), 3);
        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent[0].stage, "awakening");
        assert_eq!(recent[1].stage, "reflection");
    }
}
