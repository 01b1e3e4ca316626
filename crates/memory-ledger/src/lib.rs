//! Persistent memory ledger engine.
//!
//! The engine keeps an append-only ledger of [`MemoryRecord`]s and a tolerant
//! JSON [`Collector`] buffer, grows the ledger from a periodic breath cycle,
//! mirrors every record to a [`RecordStore`] and commits full-state snapshots
//! to two redundant file targets.
//!
//! Components, leaves first:
//! - [`loader`]: settings mapping and stage reel, degraded to empty on failure
//! - [`collector`]: tolerant ingestion buffer with LIFO and traversal access
//! - [`record`] / [`ledger`]: the memory record model and its ordered ledger
//! - [`storage`]: durable record stores (memory, JSONL file, Postgres)
//! - [`snapshot`]: the dual-target snapshot committer
//! - [`engine`]: lifecycle, breath scheduler and on-demand operations

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod collector;
pub mod config;
pub mod engine;
mod error;
pub mod ledger;
pub mod loader;
pub mod record;
pub mod snapshot;
pub mod storage;

pub use collector::{BufferEntry, Collector, CollectorSettings, Ingest};
pub use config::{BreathConfig, EngineConfig, SnapshotTargets};
pub use engine::{
    CollectorStatus, ConfigStatus, MemoryEngine, PromiseOutcome, QueryAction, QueryOutcome,
    RecentMemory, RuntimeStatus, TraversalSummary,
};
pub use error::{EngineError, EngineResult, SnapshotError, StorageError, StorageResult};
pub use ledger::{Ledger, TagDistribution};
pub use loader::StageDescriptor;
pub use record::{MemoryRecord, MemoryRecordBuilder, RecordId, Tag, DEFAULT_MARKER};
pub use snapshot::{SnapshotCommitter, SnapshotDocument};
pub use storage::{FileRecordStore, InMemoryRecordStore, RecordStore};

#[cfg(feature = "postgres")]
pub use storage::PostgresRecordStore;
