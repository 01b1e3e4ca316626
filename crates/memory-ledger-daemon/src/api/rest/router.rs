//! API Router configuration

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    create_router_with_cors(state, true)
}

/// Create the API router, optionally with a permissive CORS layer
pub fn create_router_with_cors(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Identity
        .route("/", get(handlers::root))
        .route("/portal", get(handlers::portal))
        // Lifecycle
        .route("/start", post(handlers::start_runtime))
        .route("/stop", post(handlers::stop_runtime))
        .route("/status", get(handlers::runtime_status))
        .route("/config", get(handlers::config_status))
        // Memory
        .route("/query", post(handlers::query))
        .route("/promise", post(handlers::execute_promise))
        .route("/memory", get(handlers::recent_memory))
        .route("/snapshot", post(handlers::commit_snapshot))
        // Collector
        .route(
            "/collector",
            get(handlers::collector_status).post(handlers::collect),
        );

    let router = Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
