//! Configuration for the memory ledger daemon

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use memory_ledger::EngineConfig;
use serde::{Deserialize, Serialize};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Durable record store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Start the engine when the server comes up
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            auto_start: true,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// Append-only JSONL file
    File {
        /// Record file path
        #[serde(default = "default_record_path")]
        path: PathBuf,
    },

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8001))
}

fn default_record_path() -> PathBuf {
    PathBuf::from("data/memory_records.jsonl")
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `LEDGER_`-prefixed environment variables (`__` separates nested keys).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("LEDGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8001);
        assert!(config.server.enable_cors);
        assert!(config.server.auto_start);
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.engine.breath.commit_interval, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.server.listen_addr, default_listen_addr());
        assert_eq!(config.engine.context_window_size, 128_000);
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledgerd.yaml");
        std::fs::write(
            &path,
            r#"
server:
  listen_addr: "0.0.0.0:9100"
  enable_cors: false
storage:
  type: file
  path: /var/lib/ledger/records.jsonl
engine:
  breath:
    interval_secs: 0.5
    commit_interval: 4
  collector:
    strict_mode: true
"#,
        )
        .unwrap();

        let config = DaemonConfig::load(path.to_str()).unwrap();
        assert_eq!(config.server.listen_addr.port(), 9100);
        assert!(!config.server.enable_cors);
        assert!(config.server.auto_start);
        assert!(matches!(
            config.storage,
            StorageConfig::File { ref path } if path == &PathBuf::from("/var/lib/ledger/records.jsonl")
        ));
        assert_eq!(config.engine.breath.interval_secs, 0.5);
        assert_eq!(config.engine.breath.commit_interval, 4);
        assert_eq!(config.engine.breath.error_backoff_secs, 1.0);
        assert!(config.engine.collector.strict_mode);
        assert!(config.engine.collector.comment_strip);
    }

    #[test]
    fn test_postgres_storage_defaults() {
        let storage: StorageConfig =
            serde_json::from_str(r#"{"type": "postgres", "url": "postgres://localhost/ledger"}"#)
                .unwrap();
        match storage {
            StorageConfig::Postgres {
                max_connections,
                connect_timeout_secs,
                ..
            } => {
                assert_eq!(max_connections, 10);
                assert_eq!(connect_timeout_secs, 5);
            }
            other => panic!("unexpected storage config: {other:?}"),
        }
    }
}
