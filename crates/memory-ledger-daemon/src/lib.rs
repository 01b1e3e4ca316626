//! Memory ledger daemon library
//!
//! Hosts one [`memory_ledger::MemoryEngine`] for the lifetime of the process:
//! - REST API handlers over the engine's public operations
//! - Layered configuration and storage backend selection
//! - Server lifecycle with graceful shutdown

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
