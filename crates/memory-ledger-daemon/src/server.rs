//! Server setup and lifecycle management

use std::sync::Arc;

use memory_ledger::{FileRecordStore, InMemoryRecordStore, MemoryEngine, RecordStore};
use tokio::net::TcpListener;

use crate::api::rest::router::create_router_with_cors;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};

/// Memory ledger daemon server
pub struct Server {
    config: DaemonConfig,
    engine: Arc<MemoryEngine>,
}

impl Server {
    /// Open the configured store and construct the engine
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let store = open_store(&config.storage).await?;
        tracing::info!(backend = store.backend(), "Record store ready");

        let engine = Arc::new(MemoryEngine::new(config.engine.clone(), store));

        Ok(Self { config, engine })
    }

    pub fn engine(&self) -> &Arc<MemoryEngine> {
        &self.engine
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.engine.clone());
        let app = create_router_with_cors(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Memory ledger daemon listening on {}", addr);

        if self.config.server.auto_start {
            if self.engine.start().await {
                tracing::info!("Memory runtime auto-started");
            } else {
                tracing::warn!("Memory runtime was already running at startup");
            }
        }

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Memory ledger daemon shutting down");

        if self.engine.stop().await {
            tracing::info!("Final snapshot committed");
        } else {
            tracing::error!("Final snapshot commit failed");
        }

        Ok(())
    }
}

async fn open_store(storage: &StorageConfig) -> DaemonResult<Arc<dyn RecordStore>> {
    match storage {
        StorageConfig::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
        StorageConfig::File { path } => Ok(Arc::new(FileRecordStore::new(path.clone()).await?)),
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let store = memory_ledger::PostgresRecordStore::new(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "postgres storage requires the `postgres` feature".to_string(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
