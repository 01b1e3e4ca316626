//! Memory ledger daemon
//!
//! Hosts the memory engine for the lifetime of the process:
//! - REST API over the engine's operations
//! - Breath scheduler auto-started at boot
//! - Final snapshot commit on SIGINT/SIGTERM

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memory_ledger_daemon::{DaemonConfig, Server};

/// Memory ledger daemon CLI
#[derive(Parser)]
#[command(name = "ledgerd")]
#[command(about = "Memory ledger daemon - persistent memory engine service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LEDGER_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "LEDGER_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level
    #[arg(long, env = "LEDGER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "LEDGER_LOG_JSON")]
    json: bool,

    /// Do not start the breath scheduler at boot
    #[arg(long)]
    no_auto_start: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        DaemonConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .with_context(|| format!("Invalid listen address: {listen}"))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }
    if cli.no_auto_start {
        config.server.auto_start = false;
    }

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        reel = %config.engine.reel_path.display(),
        "Starting memory ledger daemon"
    );

    let server = Server::new(config).await?;
    server.run().await?;
    Ok(())
}
