// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod normalize;
pub mod record;
pub mod search;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateError, AggregationEngine, WorkerPool};
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::ServiceError;
pub use crate::normalize::RecordNormalizer;
pub use crate::record::{AggregatedResult, JobRecord};
pub use crate::search::{SearchInput, SearchRequest, SearchService, ValidationError};
pub use crate::sources::{RawRow, RawValue, SourceAdapter, SourceId};

use std::sync::Arc;

use anyhow::Result;

/// Wire the search service from configuration: load the sources file,
/// create the worker pool, build the engine.
pub fn build_service(cfg: &AppConfig) -> Result<SearchService> {
    let entries = config::load_sources_from(&cfg.sources_path)?;
    let adapters = config::build_adapters(&entries);
    let pool = WorkerPool::new(cfg.worker_pool_size);
    let engine = AggregationEngine::new(pool).with_default_timeout(cfg.adapter_timeout);
    Ok(SearchService::new(engine, adapters))
}

/// Full HTTP application for `cfg`, plus a handle to the service for shutdown.
pub fn app(cfg: &AppConfig) -> Result<(axum::Router, Arc<SearchService>)> {
    let service = Arc::new(build_service(cfg)?);
    let router = api::router(AppState::new(Arc::clone(&service)), &cfg.cors_origins)?;
    Ok((router, service))
}
