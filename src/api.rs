// src/api.rs
//! HTTP surface. Routes are served at the root and again under `/api`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::{self, LookupEntry};
use crate::error::ServiceError;
use crate::export::{self, CSV_CONTENT_TYPE, CSV_FILENAME};
use crate::record::AggregatedResult;
use crate::search::{SearchInput, SearchService, ValidationError};

const SOURCE_ERRORS_HEADER: HeaderName = HeaderName::from_static("x-source-errors");

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

impl AppState {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self { service }
    }
}

/// CORS for `origins`. A lone `*` allows any origin without credentials;
/// `*` mixed with explicit origins, or an origin that is not a valid header
/// value, is a configuration error.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|o| o == "*") {
        if origins.len() > 1 {
            bail!("CORS origin `*` cannot be combined with explicit origins");
        }
        return Ok(base.allow_origin(AllowOrigin::any()));
    }

    let allowed = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin `{o}`")))
        .collect::<Result<Vec<_>>>()?;

    Ok(base
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true))
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search))
        .route("/export/csv", post(export_csv))
        .route("/sites", get(sites))
        .route("/job-types", get(job_types))
        .route("/countries", get(countries))
}

pub fn router(state: AppState, cors_origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run a search whose sources get cancelled if the client goes away.
async fn run_search(
    state: &AppState,
    payload: Result<Json<SearchInput>, JsonRejection>,
) -> Result<AggregatedResult, ServiceError> {
    let Json(input) = payload.map_err(|rej| ValidationError::single("body", rej.body_text()))?;
    let cancel = CancellationToken::new();
    let _on_disconnect = cancel.clone().drop_guard();
    state.service.search_with_cancel(input, cancel).await
}

async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchInput>, JsonRejection>,
) -> Result<Json<AggregatedResult>, ServiceError> {
    let result = run_search(&state, payload).await?;
    Ok(Json(result))
}

async fn export_csv(
    State(state): State<AppState>,
    payload: Result<Json<SearchInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let result = run_search(&state, payload).await?;

    let failed = result
        .source_errors()
        .keys()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let body = Body::from_stream(futures::stream::iter(export::csv_chunks(result)));
    let mut resp = (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        body,
    )
        .into_response();

    if !failed.is_empty() {
        if let Ok(v) = HeaderValue::from_str(&failed) {
            resp.headers_mut().insert(SOURCE_ERRORS_HEADER, v);
        }
    }
    Ok(resp)
}

async fn sites() -> Json<Vec<LookupEntry>> {
    Json(catalog::SITES.to_vec())
}

async fn job_types() -> Json<Vec<LookupEntry>> {
    Json(catalog::job_types())
}

async fn countries() -> Json<Vec<LookupEntry>> {
    Json(catalog::countries_by_label())
}
