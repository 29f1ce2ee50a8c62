//! Site index HTTP server.
//!
//! Serves the exported site index at the path the widget fetches it from, and
//! a small JSON query API over the same entries.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search-index.json` | The site index (path from `[remote].index_path`) |
//! | `GET`  | `/search?q=&limit=` | Query the site index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be >= 1" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so pages served from
//! another origin can fetch the index.

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::export::build_site_index;
use crate::models::{IndexEntry, SiteRecord};
use crate::search::{search_with_limit, SearchResultItem};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    records: Arc<Vec<SiteRecord>>,
    entries: Arc<Vec<IndexEntry>>,
    max_results: usize,
}

impl AppState {
    pub fn new(records: Vec<SiteRecord>, max_results: usize) -> Self {
        let entries = records
            .iter()
            .cloned()
            .filter_map(SiteRecord::into_entry)
            .collect();
        Self {
            records: Arc::new(records),
            entries: Arc::new(entries),
            max_results,
        }
    }
}

/// Builds the router; `index_path` is where the site index is served.
pub fn router(state: AppState, index_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(index_path, get(handle_site_index))
        .route("/search", get(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the server on `[server].bind`.
///
/// The site index is built from `[export].root` at startup, or read from
/// `index_file` when given. Runs until the process is terminated.
pub async fn run_server(config: &Config, index_file: Option<&Path>) -> anyhow::Result<()> {
    let records = match index_file {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read site index: {}", path.display()))?;
            serde_json::from_str::<Vec<SiteRecord>>(&body)
                .with_context(|| format!("Invalid site index: {}", path.display()))?
        }
        None => build_site_index(config)?,
    };

    let bind_addr = config.server.bind.clone();
    let count = records.len();
    let state = AppState::new(records, config.search.max_results);
    let app = router(state, &config.remote.index_path);

    tracing::info!(%bind_addr, entries = count, "site index server starting");
    println!(
        "Serving {} entries on http://{}{}",
        count, bind_addr, config.remote.index_path
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app).await?;

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

// ============ GET /search-index.json ============

async fn handle_site_index(State(state): State<AppState>) -> Json<Vec<SiteRecord>> {
    Json(state.records.as_ref().clone())
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchResultItem>,
}

/// A blank `q` returns an empty result list, like the widget.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = match params.limit {
        Some(0) => return Err(bad_request("limit must be >= 1")),
        Some(n) => n.min(state.max_results),
        None => state.max_results,
    };
    let results = search_with_limit(&params.q, &state.entries, limit);
    Ok(Json(SearchResponse {
        query: params.q,
        results: SearchResultItem::from_results(&results),
    }))
}
