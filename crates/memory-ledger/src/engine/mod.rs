//! The memory engine: lifecycle, breath scheduler and public operations.
//!
//! A [`MemoryEngine`] is constructed once by the hosting service and shared
//! as `Arc<MemoryEngine>`. Construction loads the settings mapping and the
//! stage reel. [`MemoryEngine::start`] bootstraps an empty ledger and spawns
//! the breath loop; [`MemoryEngine::stop`] ends the loop and commits a final
//! snapshot.

mod breath;
mod operations;

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::collector::{BufferEntry, Collector, Ingest};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Ledger, TagDistribution};
use crate::loader::{self, StageDescriptor};
use crate::record::{MemoryRecord, RecordId, Tag};
use crate::snapshot::{SnapshotCommitter, SnapshotDocument};
use crate::storage::RecordStore;

pub use operations::{Binding, PromiseOutcome, PromiseResult, Resolution, ThenStep};

/// Named checkpoints reported by [`MemoryEngine::config_status`].
pub const CHECKPOINTS: [&str; 5] = ["genesis", "awakening", "reflection", "5.0", "5.1"];

/// Persistent memory engine.
pub struct MemoryEngine {
    config: EngineConfig,
    ledger: Ledger,
    collector: Collector,
    store: Arc<dyn RecordStore>,
    committer: SnapshotCommitter,
    settings: Value,
    reel: Vec<StageDescriptor>,
    cycle_index: AtomicU64,
    running: AtomicBool,
    commits: AtomicU64,
    run_tx: watch::Sender<bool>,
    /// Breath loop handle. Held across every start/stop transition.
    breath_task: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryEngine {
    /// Build an engine, loading the settings mapping and stage reel named in
    /// `config`. Missing or malformed sources degrade to empty defaults.
    pub fn new(config: EngineConfig, store: Arc<dyn RecordStore>) -> Self {
        let settings = loader::load_config(&config.settings_path);
        let reel = loader::load_reel(&config.reel_path);
        let collector = Collector::new(config.collector);
        let committer = SnapshotCommitter::new(config.snapshots.clone());
        let (run_tx, _) = watch::channel(false);

        Self {
            config,
            ledger: Ledger::new(),
            collector,
            store,
            committer,
            settings,
            reel,
            cycle_index: AtomicU64::new(0),
            running: AtomicBool::new(false),
            commits: AtomicU64::new(0),
            run_tx,
            breath_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn reel(&self) -> &[StageDescriptor] {
        &self.reel
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cycle_index(&self) -> u64 {
        self.cycle_index.load(Ordering::SeqCst)
    }

    /// Number of snapshot commits attempted so far.
    pub fn snapshot_commits(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Ingest one item into the collector buffer.
    pub fn collect(&self, item: impl Into<Ingest>) -> bool {
        self.collector.collect(item)
    }

    /// Runtime summary. Tag counts are recomputed on every call.
    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus {
            running: self.is_running(),
            cycle_index: self.cycle_index(),
            ledger_size: self.ledger.len(),
            tag_distribution: self.ledger.tag_distribution(),
            last_stage: self.ledger.last_stage(),
            buffer_size: self.collector.len(),
            context_window_usage: format!(
                "{}/{}",
                self.ledger.usage_estimate(),
                self.config.context_window_size
            ),
        }
    }

    /// Dispatch a query: `introspect` traverses the buffer, `status` reports
    /// runtime status.
    pub async fn query(&self, text: &str, action: &str) -> EngineResult<QueryOutcome> {
        match action.parse::<QueryAction>()? {
            QueryAction::Introspect => Ok(QueryOutcome::Traversal(self.traverse(text).await)),
            QueryAction::Status => Ok(QueryOutcome::Status(self.status())),
        }
    }

    /// The most recent `limit` ledger records, oldest first.
    pub fn recent_memory(&self, limit: usize) -> RecentMemory {
        let memory_lines = self.ledger.recent(limit);
        RecentMemory {
            total_memory_lines: self.ledger.len(),
            returned_lines: memory_lines.len(),
            memory_lines,
        }
    }

    /// Serialize the full engine state to both snapshot targets.
    pub async fn commit_snapshot(&self) -> bool {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let document = SnapshotDocument {
            timestamp: Utc::now(),
            breath_cycle: self.cycle_index(),
            memory_lines: self.ledger.snapshot(),
            collector_buffer: self.collector.entries(),
            config: self.settings.clone(),
            context_window_usage: self.ledger.usage_estimate(),
            semantic_state: self.ledger.tag_distribution(),
        };
        self.committer.commit(&document).await
    }

    pub fn collector_status(&self) -> CollectorStatus {
        let settings = self.collector.settings();
        CollectorStatus {
            buffer_size: self.collector.len(),
            strict_mode: settings.strict_mode,
            comment_strip: settings.comment_strip,
            reverse_order: settings.reverse_order,
            recent_items: self.collector.fetch(5),
        }
    }

    pub fn config_status(&self) -> ConfigStatus {
        ConfigStatus {
            config: self.settings.clone(),
            memory_reel_stages: self.reel.len(),
            context_window: self.config.context_window_size,
            breath_interval: self.config.breath.interval().as_secs_f64(),
            semantic_tags: Tag::VOCABULARY.to_vec(),
            checkpoints: CHECKPOINTS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Best-effort insert into the durable store.
    async fn persist(&self, record: &MemoryRecord) {
        match self.store.insert_record(record).await {
            Ok(()) => debug!(record_id = %record.id, "Persisted memory record"),
            Err(e) => error!(
                record_id = %record.id,
                backend = self.store.backend(),
                error = %e,
                "Failed to persist memory record"
            ),
        }
    }

    fn advance_cycle(&self) -> EngineResult<u64> {
        self.cycle_index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(EngineError::CycleOverflow)
    }
}

/// Supported query actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
    Introspect,
    Status,
}

impl FromStr for QueryAction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introspect" => Ok(QueryAction::Introspect),
            "status" => Ok(QueryAction::Status),
            other => Err(EngineError::UnknownAction(other.to_string())),
        }
    }
}

/// Result of [`MemoryEngine::query`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Traversal(TraversalSummary),
    Status(RuntimeStatus),
}

/// Runtime status summary.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub running: bool,
    pub cycle_index: u64,
    pub ledger_size: usize,
    pub tag_distribution: TagDistribution,
    pub last_stage: Option<String>,
    pub buffer_size: usize,
    pub context_window_usage: String,
}

/// Summary returned by an introspective traversal.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalSummary {
    pub query: String,
    pub traversal_items: usize,
    pub memory_line_id: RecordId,
    pub breath_cycle: u64,
    pub results: Vec<BufferEntry>,
}

/// Recent ledger window.
#[derive(Debug, Clone, Serialize)]
pub struct RecentMemory {
    pub total_memory_lines: usize,
    pub returned_lines: usize,
    pub memory_lines: Vec<MemoryRecord>,
}

/// Collector flags and its most recent entries.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorStatus {
    pub buffer_size: usize,
    pub strict_mode: bool,
    pub comment_strip: bool,
    pub reverse_order: bool,
    pub recent_items: Vec<BufferEntry>,
}

/// Loaded configuration and engine constants.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub config: Value,
    pub memory_reel_stages: usize,
    pub context_window: usize,
    pub breath_interval: f64,
    pub semantic_tags: Vec<Tag>,
    pub checkpoints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordStore;

    fn engine(dir: &std::path::Path) -> MemoryEngine {
        MemoryEngine::new(
            EngineConfig::with_data_dir(dir),
            Arc::new(InMemoryRecordStore::new()),
        )
    }

    #[test]
    fn test_query_action_parse() {
        assert_eq!(
            "introspect".parse::<QueryAction>().unwrap(),
            QueryAction::Introspect
        );
        assert_eq!("status".parse::<QueryAction>().unwrap(), QueryAction::Status);
        assert!(matches!(
            "dance".parse::<QueryAction>(),
            Err(EngineError::UnknownAction(a)) if a == "dance"
        ));
    }

    #[test]
    fn test_status_of_fresh_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let status = engine.status();

        assert!(!status.running);
        assert_eq!(status.cycle_index, 0);
        assert_eq!(status.ledger_size, 0);
        assert_eq!(status.last_stage, None);
        assert_eq!(status.tag_distribution, TagDistribution::default());
        assert!(status.context_window_usage.ends_with("/128000"));
    }

    #[test]
    fn test_config_status_reports_constants() {
        let dir = tempfile::tempdir().unwrap();
        let status = engine(dir.path()).config_status();

        assert_eq!(status.config, serde_json::json!({}));
        assert_eq!(status.memory_reel_stages, 0);
        assert_eq!(status.breath_interval, 3.0);
        assert_eq!(status.semantic_tags, Tag::VOCABULARY.to_vec());
        assert_eq!(status.checkpoints.len(), 5);
    }

    #[test]
    fn test_collector_status_shows_last_five() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        for n in 0..8 {
            engine.collect(serde_json::json!({ "n": n }));
        }

        let status = engine.collector_status();
        assert_eq!(status.buffer_size, 8);
        assert!(status.reverse_order);
        assert_eq!(status.recent_items.len(), 5);
        assert_eq!(
            status.recent_items[0],
            BufferEntry::Structured(serde_json::json!({ "n": 3 }))
        );
    }

    #[test]
    fn test_advance_cycle_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        engine.cycle_index.store(u64::MAX, Ordering::SeqCst);
        assert!(matches!(
            engine.advance_cycle(),
            Err(EngineError::CycleOverflow(u64::MAX))
        ));
    }

    #[tokio::test]
    async fn test_unknown_query_action() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        assert!(matches!(
            engine.query("anything", "dance").await,
            Err(EngineError::UnknownAction(_))
        ));
        assert!(engine.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_query_status_action() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        match engine.query("", "status").await.unwrap() {
            QueryOutcome::Status(status) => assert_eq!(status.ledger_size, 0),
            other => panic!("expected status, got {other:?}"),
        }
    }
}
