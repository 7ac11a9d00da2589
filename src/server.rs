//! JSON HTTP API.
//!
//! Serves the last-known enriched state while refreshes run in the
//! background. HTML rendering is left to clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/data` | Records, progress, stats, `is_loading` |
//! | `POST`/`GET` | `/api/refresh` | Start a background refresh |
//! | `GET`  | `/api/history/{owner}/{name}` | Snapshot and growth history |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no snapshots for acme/widget" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser dashboards
//! on other origins can poll the API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use traction_scout_core::models::EntityId;

use crate::config::Config;
use crate::db;
use crate::history::{entity_history, EntityHistory};
use crate::refresh::{spawn_refresh, RefreshContext, RefreshSettings};
use crate::source::{FileSource, MetricSource};
use crate::sqlite_store::SqliteStore;
use crate::state::{AppState, DataView};

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct ServerState {
    pub refresh: Arc<RefreshContext>,
    pub history_days: i64,
}

/// Builds the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/data", get(handle_data))
        .route("/api/refresh", get(handle_refresh).post(handle_refresh))
        .route("/api/history/{owner}/{name}", get(handle_history))
        .layer(cors)
        .with_state(state)
}

/// Loads state from the configured database and serves until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool));
    let catalog = Arc::new(config.load_catalog()?);
    let app_state = Arc::new(AppState::load(store.as_ref(), &catalog).await?);
    let source: Option<Arc<dyn MetricSource>> = config
        .source
        .path
        .as_ref()
        .map(|p| Arc::new(FileSource::new(p)) as Arc<dyn MetricSource>);

    tracing::info!(
        records = app_state.records().len(),
        source = source.as_ref().map(|s| s.name().to_string()).unwrap_or_default(),
        "loaded last-known state"
    );

    let state = ServerState {
        refresh: Arc::new(RefreshContext {
            store,
            catalog,
            source,
            settings: RefreshSettings::from_config(config),
            state: app_state,
        }),
        history_days: config.history.days,
    };

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("Traction Scout API listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/data ============

async fn handle_data(State(state): State<ServerState>) -> Json<DataView> {
    Json(state.refresh.state.view())
}

// ============ POST|GET /api/refresh ============

#[derive(Serialize)]
struct RefreshResponse {
    status: &'static str,
}

async fn handle_refresh(State(state): State<ServerState>) -> Json<RefreshResponse> {
    let started = spawn_refresh(Arc::clone(&state.refresh));
    Json(RefreshResponse {
        status: started.as_str(),
    })
}

// ============ GET /api/history/{owner}/{name} ============

async fn handle_history(
    State(state): State<ServerState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<EntityHistory>, AppError> {
    if owner.trim().is_empty() || name.trim().is_empty() {
        return Err(bad_request("owner and name must not be empty"));
    }
    let id = EntityId::new(owner, name);
    let history = entity_history(
        state.refresh.store.as_ref(),
        &id,
        state.history_days,
        Utc::now().date_naive(),
    )
    .await
    .map_err(internal)?;

    if history.snapshots.is_empty() {
        return Err(not_found(format!("no snapshots for {}", id)));
    }
    Ok(Json(history))
}
