//! HTTP surface: `/query`, `/recommend` and `/healthz`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogError, CatalogItem};
use crate::recommend::{recommend, Recommendation, ScoredItem};
use crate::source::{Catalog, CatalogSource};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn CatalogSource>,
    default_top_n: usize,
}

impl AppState {
    /// Builds state around a catalog source.
    pub fn new(source: Arc<dyn CatalogSource>, default_top_n: usize) -> Self {
        Self {
            source,
            default_top_n,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/query", get(query_handler))
        .route("/recommend", get(recommend_handler))
        .with_state(state)
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The catalog is empty and the endpoint treats that as missing data.
    #[error("No product data available")]
    NoData,
    /// The catalog source failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// The ranking task did not complete.
    #[error("ranking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NoData => StatusCode::NOT_FOUND,
            Self::Catalog(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_http(self) -> (StatusCode, Json<ErrorBody>) {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
    }
}

/// JSON error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub message: String,
}

type HandlerError = (StatusCode, Json<ErrorBody>);

/// Parameters for `/query`.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Free-text query; required, may be empty.
    pub q: String,
    /// Maximum results.
    pub top_n: Option<usize>,
}

/// Parameters for `/recommend`.
#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    /// Free-text query; required, may be empty.
    pub query: String,
    /// Maximum results.
    pub top_n: Option<usize>,
}

/// Response body for `/query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// Ranked rows in the catalog's column naming.
    pub results: Vec<CatalogRow>,
}

/// Catalog row as rendered by `/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    /// Product name.
    #[serde(rename = "Assessment Name")]
    pub name: String,
    /// Product URL.
    #[serde(rename = "URL")]
    pub url: String,
    /// "Yes" or "No".
    #[serde(rename = "Remote Testing Support")]
    pub remote: &'static str,
    /// "Yes" or "No".
    #[serde(rename = "Adaptive/IRT Support")]
    pub adaptive: &'static str,
}

impl From<&CatalogItem> for CatalogRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            name: item.name.clone(),
            url: item.url.clone(),
            remote: yes_no(item.supports_remote),
            adaptive: yes_no(item.supports_adaptive),
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, HandlerError> {
    let top_n = params.top_n.unwrap_or(state.default_top_n);
    let catalog = state.source.load().await.map_err(|err| ApiError::from(err).into_http())?;
    if catalog.is_empty() {
        return Err(ApiError::NoData.into_http());
    }
    let scored = run_pipeline(catalog, params.q, top_n, "/query")
        .await
        .map_err(ApiError::into_http)?;
    let results = scored.iter().map(|s| CatalogRow::from(&s.item)).collect();
    Ok(Json(QueryResponse { results }))
}

async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<Recommendation>>, HandlerError> {
    let top_n = params.top_n.unwrap_or(state.default_top_n);
    let catalog = state.source.load().await.map_err(|err| ApiError::from(err).into_http())?;
    if catalog.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let scored = run_pipeline(catalog, params.query, top_n, "/recommend")
        .await
        .map_err(ApiError::into_http)?;
    Ok(Json(scored.iter().map(Recommendation::from).collect()))
}

async fn run_pipeline(
    catalog: Catalog,
    query: String,
    top_n: usize,
    endpoint: &'static str,
) -> Result<Vec<ScoredItem>, ApiError> {
    let start = Instant::now();
    let catalog_size = catalog.len();
    let query_for_log = query.clone();
    let scored =
        tokio::task::spawn_blocking(move || recommend(&catalog, &query, top_n)).await?;
    info!(
        endpoint,
        query = %query_for_log,
        top_n,
        catalog_size,
        results = scored.len(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "recommendations ranked"
    );
    Ok(scored)
}
