//! Storage trait definitions

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::record::MemoryRecord;

/// Insert-only durable mirror of the ledger.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one record.
    async fn insert_record(&self, record: &MemoryRecord) -> StorageResult<()>;

    /// Number of persisted records.
    async fn count_records(&self) -> StorageResult<usize>;

    /// The most recent `limit` persisted records, oldest first.
    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<MemoryRecord>>;

    /// Short backend name for logs and status output.
    fn backend(&self) -> &'static str;
}
