//! Identity, lifecycle and status handlers

use axum::{extract::State, Json};
use memory_ledger::{ConfigStatus, RuntimeStatus};
use serde::Serialize;

use crate::api::rest::state::AppState;

/// Banner response
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Service banner
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Memory ledger engine active".to_string(),
        version: state.version.clone(),
    })
}

/// Portal response
#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub portal: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub runtime_status: RuntimeStatus,
    pub endpoints: PortalEndpoints,
}

/// Endpoint map advertised by the portal
#[derive(Debug, Serialize)]
pub struct PortalEndpoints {
    pub start: &'static str,
    pub stop: &'static str,
    pub status: &'static str,
    pub query: &'static str,
    pub promise: &'static str,
    pub memory: &'static str,
    pub snapshot: &'static str,
    pub collector: &'static str,
    pub config: &'static str,
}

const ENDPOINTS: PortalEndpoints = PortalEndpoints {
    start: "/api/start",
    stop: "/api/stop",
    status: "/api/status",
    query: "/api/query",
    promise: "/api/promise",
    memory: "/api/memory",
    snapshot: "/api/snapshot",
    collector: "/api/collector",
    config: "/api/config",
};

/// Identity, runtime status and endpoint map
pub async fn portal(State(state): State<AppState>) -> Json<PortalResponse> {
    Json(PortalResponse {
        portal: "Memory ledger runtime portal".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        runtime_status: state.engine.status(),
        endpoints: ENDPOINTS,
    })
}

/// Start response
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub status: String,
    pub message: String,
    pub running: bool,
}

/// Start the breath scheduler
pub async fn start_runtime(State(state): State<AppState>) -> Json<StartResponse> {
    let started = state.engine.start().await;

    let (status, message) = if started {
        ("started", "Memory runtime is now active")
    } else {
        ("already_running", "Memory runtime was already active")
    };

    Json(StartResponse {
        status: status.to_string(),
        message: message.to_string(),
        running: state.engine.is_running(),
    })
}

/// Stop response
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: String,
    pub message: String,
    pub final_snapshot: String,
}

/// Stop the breath scheduler and commit a final snapshot
pub async fn stop_runtime(State(state): State<AppState>) -> Json<StopResponse> {
    let committed = state.engine.stop().await;

    Json(StopResponse {
        status: "stopped".to_string(),
        message: "Memory runtime has been stopped".to_string(),
        final_snapshot: if committed { "committed" } else { "failed" }.to_string(),
    })
}

/// Current runtime status
pub async fn runtime_status(State(state): State<AppState>) -> Json<RuntimeStatus> {
    Json(state.engine.status())
}

/// Loaded settings and engine constants
pub async fn config_status(State(state): State<AppState>) -> Json<ConfigStatus> {
    Json(state.engine.config_status())
}
