//! Query, promise chain, ledger and snapshot handlers

use axum::{
    extract::{Query, State},
    Json,
};
use memory_ledger::{PromiseOutcome, QueryOutcome, RecentMemory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};

const DEFAULT_MEMORY_LIMIT: usize = 50;

/// Query request
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    "introspect".to_string()
}

/// Run an introspective traversal or report status
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<QueryOutcome>> {
    let outcome = state.engine.query(&request.query, &request.action).await?;
    Ok(Json(outcome))
}

/// Promise chain request
#[derive(Debug, Deserialize)]
pub struct PromiseRequest {
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub chain_type: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Execute the promise chain against the request data
pub async fn execute_promise(
    State(state): State<AppState>,
    Json(request): Json<PromiseRequest>,
) -> Json<PromiseOutcome> {
    if let Some(chain_type) = &request.chain_type {
        tracing::debug!(chain_type = %chain_type, "Promise chain requested");
    }
    Json(state.engine.execute_promise(&request.data))
}

/// Ledger window parameters
#[derive(Debug, Deserialize)]
pub struct MemoryParams {
    pub limit: Option<usize>,
}

/// Most recent ledger records
pub async fn recent_memory(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> Json<RecentMemory> {
    let limit = params.limit.unwrap_or(DEFAULT_MEMORY_LIMIT);
    Json(state.engine.recent_memory(limit))
}

/// Snapshot response
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub status: String,
    pub message: String,
    pub locations: Vec<String>,
}

/// Commit a snapshot on demand
pub async fn commit_snapshot(State(state): State<AppState>) -> ApiResult<Json<SnapshotResponse>> {
    if !state.engine.commit_snapshot().await {
        return Err(ApiError::Internal("Snapshot commit failed".to_string()));
    }

    let locations = state
        .engine
        .config()
        .snapshots
        .paths()
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    Ok(Json(SnapshotResponse {
        status: "committed".to_string(),
        message: "Memory snapshot committed successfully".to_string(),
        locations,
    }))
}
