use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for durable store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown query action: {0}")]
    UnknownAction(String),

    #[error("breath cycle counter overflowed at {0}")]
    CycleOverflow(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot commit errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot target {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
