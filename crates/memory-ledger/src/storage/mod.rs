//! Durable record stores.
//!
//! The engine only ever inserts into the store. Reads exist for inspection
//! and tests.

mod file;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod traits;

pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRecordStore;
pub use traits::RecordStore;
