//! HTTP API served on an ephemeral port.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;

use traction_scout::refresh::{RefreshContext, RefreshSettings};
use traction_scout::server::{router, ServerState};
use traction_scout::source::{FileSource, MetricSource};
use traction_scout::state::AppState;
use traction_scout_core::catalog::Catalog;
use traction_scout_core::models::RawMetricRecord;
use traction_scout_core::pipeline::EnrichmentPipeline;
use traction_scout_core::store::memory::InMemoryStore;

const RECORDS: &str = r#"{"owner":"acme","name":"vectordb","description":"Vector search for LLM apps","stars":1000,"forks":40,"contributors":12}
{"owner":"acme","name":"authkit","description":"Open source authentication and SSO","stars":800,"forks":30,"contributors":6}
"#;

async fn serve(source: Option<Arc<dyn MetricSource>>, seed: bool) -> String {
    let store = Arc::new(InMemoryStore::new());
    let catalog = Arc::new(Catalog::builtin());

    if seed {
        let pipeline = EnrichmentPipeline::new(store.as_ref(), &catalog);
        let raw = RawMetricRecord {
            owner: "acme".into(),
            name: "widget".into(),
            stars: Some(300),
            contributors: Some(4),
            ..Default::default()
        };
        pipeline.enrich(raw, Utc::now().date_naive()).await.unwrap();
    }

    let app_state = Arc::new(AppState::load(store.as_ref(), &catalog).await.unwrap());
    let state = ServerState {
        refresh: Arc::new(RefreshContext {
            store,
            catalog,
            source,
            settings: RefreshSettings {
                max_fork_ratio: 5.0,
                limit: None,
            },
            state: app_state,
        }),
        history_days: 90,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn health_reports_version() {
    let base = serve(None, false).await;
    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn data_serves_last_known_state() {
    let base = serve(None, true).await;
    let body: serde_json::Value = reqwest::get(format!("{}/api/data", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["is_loading"], false);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["records"][0]["name"], "widget");
    assert_eq!(body["snapshot_count"], 1);
    assert_eq!(body["progress"]["phase"], "idle");
}

#[tokio::test]
async fn history_found_and_missing() {
    let base = serve(None, true).await;

    let resp = reqwest::get(format!("{}/api/history/acme/widget", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["snapshots"].as_array().unwrap().len(), 1);

    let resp = reqwest::get(format!("{}/api/history/acme/nothing", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn refresh_runs_in_background_and_publishes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("records.jsonl");
    fs::write(&path, RECORDS).unwrap();
    let source: Arc<dyn MetricSource> = Arc::new(FileSource::new(&path));
    let base = serve(Some(source), false).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/api/refresh", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "refreshing");

    let mut view = serde_json::Value::Null;
    for _ in 0..50 {
        view = client
            .get(format!("{}/api/data", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if view["is_loading"] == false && view["progress"]["phase"] == "complete" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(view["progress"]["phase"], "complete");
    assert_eq!(view["progress"]["total"], 2);
    assert_eq!(view["records"].as_array().unwrap().len(), 2);
    assert!(view["last_updated"].is_string());
}

#[tokio::test]
async fn refresh_without_source_reports_error_phase() {
    let base = serve(None, false).await;
    let body: serde_json::Value = reqwest::get(format!("{}/api/refresh", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "refreshing");

    let mut phase = serde_json::Value::Null;
    for _ in 0..50 {
        let view: serde_json::Value = reqwest::get(format!("{}/api/data", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        phase = view["progress"]["phase"].clone();
        if phase == "error" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(phase, "error");
}
