//! On-demand record-producing operations.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{MemoryEngine, TraversalSummary};
use crate::error::EngineResult;
use crate::record::{MemoryRecord, RecordId, Tag, DEFAULT_MARKER};

const PROMISE_STAGE: &str = "promise_chain";
const INTROSPECTION_STAGE: &str = "introspection";
const PREVIEW_CHARS: usize = 100;
const TRAVERSAL_RESULTS: usize = 10;

/// One named step of the promise chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThenStep {
    pub action: String,
    pub result: String,
}

impl ThenStep {
    fn new(action: &str, result: &str) -> Self {
        Self {
            action: action.to_string(),
            result: result.to_string(),
        }
    }
}

/// Binding summary entry derived from runtime counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Binding {
    Commit { commit: String, memory: String },
    Loopback { loopback: String, reconciled: bool },
}

/// Resolution block of a promise chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub resolution: String,
    #[serde(rename = "hash")]
    pub marker: String,
    pub status: String,
    pub runtime: String,
    pub memory_line_id: RecordId,
}

/// Fixed-shape promise chain result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromiseResult {
    pub then: Vec<ThenStep>,
    pub this: Vec<Binding>,
    #[serde(rename = "final")]
    pub resolution: Resolution,
}

/// Outcome of [`MemoryEngine::execute_promise`]. Failures are reported in
/// the payload rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PromiseOutcome {
    Fulfilled(PromiseResult),
    Failed { error: String, status: String },
}

impl PromiseOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, PromiseOutcome::Fulfilled(_))
    }
}

impl MemoryEngine {
    /// Seed the ledger from the stage reel, persisting each record before
    /// moving on. Returns the number of records created.
    pub async fn bootstrap(&self) -> usize {
        info!(stages = self.reel.len(), "Bootstrapping memory from reel");
        let cycle = self.cycle_index();

        for stage in &self.reel {
            let record = MemoryRecord::builder(stage.stage.clone())
                .state(stage.state.clone())
                .identity(stage.identity.clone())
                .memory(stage.memory.iter().cloned())
                .tags(Tag::VOCABULARY)
                .cycle_index(cycle)
                .build();

            self.ledger.append(record.clone());
            self.persist(&record).await;
        }

        info!(lines = self.ledger.len(), "Bootstrap complete");
        self.reel.len()
    }

    /// Run the promise chain template against `input`.
    ///
    /// Appends the result to the collector and one `completed` record to the
    /// ledger. Never suspends; the durable mirror of the record happens on a
    /// detached task when a runtime is available.
    pub fn execute_promise(&self, input: &Value) -> PromiseOutcome {
        match self.resolve_promise(input) {
            Ok(result) => PromiseOutcome::Fulfilled(result),
            Err(e) => {
                error!(error = %e, "Error in promise chain");
                PromiseOutcome::Failed {
                    error: e.to_string(),
                    status: "failed".to_string(),
                }
            }
        }
    }

    fn resolve_promise(&self, input: &Value) -> EngineResult<PromiseResult> {
        let cycle = self.cycle_index();
        let lines = self.ledger.len();

        let record = MemoryRecord::builder(PROMISE_STAGE)
            .state("processing")
            .identity("promise_chain.executor")
            .memory([format!("Processing input: {}...", preview(input))])
            .tags(Tag::VOCABULARY)
            .cycle_index(cycle)
            .build();

        let result = PromiseResult {
            then: vec![
                ThenStep::new("process_input", "data collected"),
                ThenStep::new("apply_qchain", "chain resolved"),
                ThenStep::new("braid_memory", "memory braided"),
                ThenStep::new("commit_state", "state committed"),
            ],
            this: vec![
                Binding::Commit {
                    commit: format!("breath_cycle = {cycle}"),
                    memory: format!("runtime {lines} lines"),
                },
                Binding::Commit {
                    commit: "semantic_braid".to_string(),
                    memory: "ancestral-emotional-symbolic tags".to_string(),
                },
                Binding::Loopback {
                    loopback: "promise → this → then → this".to_string(),
                    reconciled: true,
                },
            ],
            resolution: Resolution {
                resolution: "this.then().then(this).resolve()".to_string(),
                marker: DEFAULT_MARKER.to_string(),
                status: "fulfilled".to_string(),
                runtime: "persistent".to_string(),
                memory_line_id: record.id,
            },
        };

        self.collector.collect(serde_json::to_value(&result)?);

        let record = record.amend("completed", "Promise chain resolved successfully");
        self.ledger.append(record.clone());
        self.mirror(record);

        Ok(result)
    }

    /// Traverse the collector buffer and record the traversal in the ledger.
    pub async fn traverse(&self, query: &str) -> TraversalSummary {
        info!(query, "Performing introspective traversal");

        let items = self.collector.iterate(true);
        let cycle = self.cycle_index();

        let record = MemoryRecord::builder(INTROSPECTION_STAGE)
            .state("traversal_active")
            .identity("introspection.mirror")
            .memory([
                format!("Query: {query}"),
                format!("Traversed {} items", items.len()),
                "Index walk applied".to_string(),
            ])
            .tags([Tag::Emotional, Tag::Symbolic])
            .cycle_index(cycle)
            .build();

        self.ledger.append(record.clone());
        self.persist(&record).await;

        let start = items.len().saturating_sub(TRAVERSAL_RESULTS);
        TraversalSummary {
            query: query.to_string(),
            traversal_items: items.len(),
            memory_line_id: record.id,
            breath_cycle: cycle,
            results: items[start..].to_vec(),
        }
    }

    /// Persist on a detached task when called inside a tokio runtime.
    fn mirror(&self, record: MemoryRecord) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    if let Err(e) = store.insert_record(&record).await {
                        error!(record_id = %record.id, error = %e, "Failed to mirror memory record");
                    }
                });
            }
            Err(_) => debug!(record_id = %record.id, "No runtime, record kept in ledger only"),
        }
    }
}

fn preview(input: &Value) -> String {
    input.to_string().chars().take(PREVIEW_CHARS).collect()
}
