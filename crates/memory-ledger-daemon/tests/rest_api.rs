//! REST surface tests driven through the router with `oneshot`.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use memory_ledger::{EngineConfig, InMemoryRecordStore, MemoryEngine};
use memory_ledger_daemon::api::create_router;
use memory_ledger_daemon::api::rest::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(dir: &Path, configure: impl FnOnce(&mut EngineConfig)) -> (Router, Arc<MemoryEngine>) {
    let mut config = EngineConfig::with_data_dir(dir);
    config.breath.interval_secs = 60.0;
    configure(&mut config);

    let engine = Arc::new(MemoryEngine::new(
        config,
        Arc::new(InMemoryRecordStore::new()),
    ));
    (create_router(AppState::new(engine.clone())), engine)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(serde_json::to_string(&body).unwrap())
        }
        None => Body::empty(),
    };

    let resp = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn root_and_portal_return_200() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(&app, "GET", "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = call(&app, "GET", "/api/portal", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runtime_status"]["running"], false);
    assert_eq!(body["endpoints"]["promise"], "/api/promise");
}

#[tokio::test]
async fn start_twice_then_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(&app, "POST", "/api/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");

    let (_, body) = call(&app, "POST", "/api/start", None).await;
    assert_eq!(body["status"], "already_running");
    assert_eq!(body["running"], true);

    let (status, body) = call(&app, "POST", "/api/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_snapshot"], "committed");
    assert!(!engine.is_running());
    assert!(engine.config().snapshots.primary.exists());
}

#[tokio::test]
async fn status_reports_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});
    engine.breathe().await.unwrap();

    let (status, body) = call(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle_index"], 1);
    assert_eq!(body["ledger_size"], 1);
    assert_eq!(body["last_stage"], "breath");
    assert_eq!(body["tag_distribution"]["ancestral"], 1);
}

#[tokio::test]
async fn query_unknown_action_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(
        &app,
        "POST",
        "/api/query",
        Some(json!({ "query": "x", "action": "dance" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNKNOWN_ACTION");
    assert!(engine.ledger().is_empty());
}

#[tokio::test]
async fn query_defaults_to_introspect() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});
    engine.collect(json!({ "seen": true }));

    let (status, body) = call(&app, "POST", "/api/query", Some(json!({ "query": "who" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "who");
    assert_eq!(body["traversal_items"], 1);
    assert_eq!(body["results"][0]["seen"], true);
    assert_eq!(engine.ledger().len(), 1);
}

#[tokio::test]
async fn promise_chain_returns_fulfilled_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(
        &app,
        "POST",
        "/api/promise",
        Some(json!({ "data": {}, "chain_type": "promise_then_this" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["then"].as_array().unwrap().len(), 4);
    assert_eq!(body["final"]["status"], "fulfilled");
    assert_eq!(body["final"]["hash"], "∞");

    let record = engine.ledger().snapshot().pop().unwrap();
    assert_eq!(body["final"]["memory_line_id"], record.id.to_string());
    assert_eq!(engine.collector().len(), 1);
}

#[tokio::test]
async fn memory_limit_defaults_and_applies() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |_| {});
    for _ in 0..60 {
        engine.breathe().await.unwrap();
    }

    let (status, body) = call(&app, "GET", "/api/memory", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_memory_lines"], 60);
    assert_eq!(body["returned_lines"], 50);

    let (_, body) = call(&app, "GET", "/api/memory?limit=3", None).await;
    assert_eq!(body["returned_lines"], 3);
    assert_eq!(body["memory_lines"][2]["cycle_index"], 60);
}

#[tokio::test]
async fn snapshot_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _engine) = test_app(dir.path(), |_| {});
    let (status, body) = call(&app, "POST", "/api/snapshot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");
    assert_eq!(body["locations"].as_array().unwrap().len(), 2);

    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let (app, _engine) = test_app(dir.path(), |config| {
        config.snapshots.primary = blocker.join("snapshot.json");
    });
    let (status, body) = call(&app, "POST", "/api/snapshot", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn collector_ingest_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(
        &app,
        "POST",
        "/api/collector",
        Some(json!({ "item": "{\"a\": 1} // note" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buffer_size"], 1);

    let (_, body) = call(&app, "POST", "/api/collector", Some(json!({ "item": "{bad json" }))).await;
    assert_eq!(body["collected"], true);

    let (status, body) = call(&app, "GET", "/api/collector", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buffer_size"], 2);
    assert_eq!(body["recent_items"][0]["a"], 1);
    assert_eq!(body["recent_items"][1]["partial_state"], "{bad json");
}

#[tokio::test]
async fn strict_collector_rejects_with_422() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = test_app(dir.path(), |config| {
        config.collector.strict_mode = true;
    });

    let (status, body) = call(&app, "POST", "/api/collector", Some(json!({ "item": "{bad" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(engine.collector().is_empty());
}

#[tokio::test]
async fn config_reports_constants() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.yaml"), "mode: 5o\nsync_root: q\n").unwrap();
    let (app, _engine) = test_app(dir.path(), |_| {});

    let (status, body) = call(&app, "GET", "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["mode"], "5o");
    assert_eq!(body["context_window"], 128000);
    assert_eq!(body["breath_interval"], 60.0);
    assert_eq!(
        body["semantic_tags"],
        json!(["ancestral", "emotional", "symbolic"])
    );
    assert_eq!(body["checkpoints"][0], "genesis");
}
