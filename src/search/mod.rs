// src/search/mod.rs
//! Search entry point: validate the input, restrict the adapter registry to
//! the requested sources, and run the aggregation.

pub mod request;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregate::AggregationEngine;
use crate::catalog;
use crate::error::ServiceError;
use crate::record::AggregatedResult;
use crate::sources::{SourceAdapter, SourceId};

pub use request::{
    Constraints, DescriptionFormat, JobType, SearchInput, SearchRequest, ValidationError,
    Violation,
};

pub struct SearchService {
    engine: AggregationEngine,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    known_sources: Vec<SourceId>,
    default_sources: Vec<SourceId>,
    countries: Vec<&'static str>,
}

impl SearchService {
    /// Known sources are the catalog sites plus any registered adapter ids.
    /// Requests without `site_name` go to every registered adapter, or to the
    /// whole catalog when nothing is registered.
    pub fn new(engine: AggregationEngine, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        let mut known_sources = catalog::site_ids();
        for a in &adapters {
            if !known_sources.contains(a.id()) {
                known_sources.push(a.id().clone());
            }
        }
        let default_sources = if adapters.is_empty() {
            catalog::site_ids()
        } else {
            adapters.iter().map(|a| a.id().clone()).collect()
        };

        tracing::info!(
            adapters = adapters.len(),
            pool_size = engine.pool().size(),
            "search service ready"
        );

        Self {
            engine,
            adapters,
            known_sources,
            default_sources,
            countries: catalog::country_values(),
        }
    }

    pub fn registered_sources(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|a| a.id().clone()).collect()
    }

    pub fn validate(&self, input: SearchInput) -> Result<SearchRequest, ValidationError> {
        input.validate(&Constraints {
            known_sources: &self.known_sources,
            default_sources: &self.default_sources,
            countries: &self.countries,
        })
    }

    pub async fn search(&self, input: SearchInput) -> Result<AggregatedResult, ServiceError> {
        self.search_with_cancel(input, CancellationToken::new()).await
    }

    pub async fn search_with_cancel(
        &self,
        input: SearchInput,
        cancel: CancellationToken,
    ) -> Result<AggregatedResult, ServiceError> {
        let request = self.validate(input)?;
        let selected: Vec<Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| request.sources().contains(a.id()))
            .cloned()
            .collect();
        let result = self
            .engine
            .aggregate_with_cancel(&request, &selected, cancel)
            .await?;
        Ok(result)
    }

    /// Close the worker pool; later searches fail with a total failure.
    pub fn shutdown(&self) {
        self.engine.pool().shutdown();
    }
}
