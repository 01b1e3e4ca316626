//! Collector handlers

use axum::{extract::State, Json};
use memory_ledger::{CollectorStatus, Ingest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};

/// Collector status
pub async fn collector_status(State(state): State<AppState>) -> Json<CollectorStatus> {
    Json(state.engine.collector_status())
}

/// Collect request. A string item is parsed as JSON text, anything else is
/// stored as-is.
#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    pub item: Value,
}

/// Collect response
#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub collected: bool,
    pub buffer_size: usize,
}

/// Ingest one item into the collector
pub async fn collect(
    State(state): State<AppState>,
    Json(request): Json<CollectRequest>,
) -> ApiResult<Json<CollectResponse>> {
    let item = match request.item {
        Value::String(text) => Ingest::Text(text),
        value => Ingest::Value(value),
    };

    if !state.engine.collect(item) {
        return Err(ApiError::Validation(
            "Collector rejected malformed JSON in strict mode".to_string(),
        ));
    }

    Ok(Json(CollectResponse {
        collected: true,
        buffer_size: state.engine.collector().len(),
    }))
}
