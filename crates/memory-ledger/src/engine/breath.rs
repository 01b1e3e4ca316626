//! Breath scheduler: the single periodic task that grows the ledger.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::MemoryEngine;
use crate::error::EngineResult;
use crate::record::{MemoryRecord, Tag};

pub(crate) const BREATH_STAGE: &str = "breath";

impl MemoryEngine {
    /// Transition to running.
    ///
    /// Bootstraps an empty ledger, then spawns the breath loop. Returns
    /// `false` without side effects when already running. The lifecycle
    /// lock is held for the whole transition, so a concurrent `stop()` waits
    /// for the loop to exist and there is never more than one loop.
    pub async fn start(self: &Arc<Self>) -> bool {
        let mut task = self.breath_task.lock().await;

        if task.is_some()
            || self
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            warn!("Memory runtime already running, start ignored");
            return false;
        }

        info!("Starting memory runtime");

        if self.ledger.is_empty() {
            self.bootstrap().await;
        }

        self.run_tx.send_replace(true);
        let run_rx = self.run_tx.subscribe();
        let engine = Arc::clone(self);
        *task = Some(tokio::spawn(async move { engine.breathe_loop(run_rx).await }));

        info!(
            interval_secs = self.config.breath.interval_secs,
            "Memory runtime is active"
        );
        true
    }

    /// Transition to stopped, wait for the breath loop to exit and commit a
    /// final snapshot. Returns the result of that commit.
    pub async fn stop(&self) -> bool {
        let mut task = self.breath_task.lock().await;

        info!("Stopping memory runtime");
        self.running.store(false, Ordering::SeqCst);
        self.run_tx.send_replace(false);

        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Breath loop ended abnormally");
            }
        }

        let committed = self.commit_snapshot().await;
        info!(committed, "Memory runtime stopped");
        committed
    }

    /// Run one breath: advance the cycle, append and persist a breath
    /// record, and commit a snapshot on the configured cadence.
    pub async fn breathe(&self) -> EngineResult<u64> {
        let cycle = self.advance_cycle()?;
        info!(cycle, lines = self.ledger.len(), "Breath cycle");

        let record = MemoryRecord::builder(BREATH_STAGE)
            .state("active_cycle")
            .identity("breath_scheduler")
            .memory([
                format!("Cycle {cycle}"),
                "Introspective traversal".to_string(),
                "Memory braid sync".to_string(),
            ])
            .tags([Tag::Ancestral])
            .cycle_index(cycle)
            .build();

        self.ledger.append(record.clone());
        self.persist(&record).await;

        if self.config.breath.commits_on(cycle) {
            self.commit_snapshot().await;
        }

        Ok(cycle)
    }

    async fn breathe_loop(self: Arc<Self>, mut run_rx: watch::Receiver<bool>) {
        let interval = self.config.breath.interval();
        let backoff = self.config.breath.error_backoff();

        while self.is_running() {
            let pause = match self.breathe().await {
                Ok(_) => interval,
                Err(e) => {
                    error!(error = %e, "Error in breath cycle");
                    backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = run_rx.wait_for(|running| !*running) => break,
            }
        }

        info!(cycle = self.cycle_index(), "Breath loop exited");
    }
}
