// src/aggregate/mod.rs
//! Aggregation engine: fans one search out to every requested source,
//! bounded by the shared [`WorkerPool`], and merges whatever comes back.
//!
//! Policy: a failing source never fails the request. Its error is recorded
//! under its id and siblings keep running. Records are merged in the order
//! sources finish; nothing is sorted or truncated across sources.

pub mod pool;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::normalize::RecordNormalizer;
use crate::record::{AggregatedResult, JobRecord};
use crate::search::SearchRequest;
use crate::sources::{RawRow, SourceAdapter, SourceId};

pub use pool::{PoolClosed, WorkerPool, DEFAULT_POOL_SIZE};

/// Request-level failure: the engine could not dispatch at all.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("aggregation unavailable: {0}")]
    PoolShutDown(#[from] PoolClosed),
}

/// Why one source produced no rows. Recorded as data, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum SourceFailure {
    #[error("{0:#}")]
    Adapter(anyhow::Error),
    #[error("timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("worker pool shut down")]
    PoolClosed,
    #[error("no adapter configured for this source")]
    NotConfigured,
    #[error("adapter task panicked")]
    Panicked,
}

#[derive(Debug, Default)]
struct MergeBuffer {
    records: Vec<JobRecord>,
    errors: BTreeMap<SourceId, String>,
    settled: HashSet<SourceId>,
}

impl MergeBuffer {
    fn push_records(&mut self, source: SourceId, mut records: Vec<JobRecord>) {
        self.records.append(&mut records);
        self.settled.insert(source);
    }

    fn record_error(&mut self, source: SourceId, failure: &SourceFailure) {
        tracing::warn!(target: "aggregate", source = %source, error = %failure, "source failed");
        counter!("aggregate_source_errors_total", "source" => source.to_string()).increment(1);
        self.errors.insert(source.clone(), failure.to_string());
        self.settled.insert(source);
    }
}

fn lock(buffer: &Mutex<MergeBuffer>) -> MutexGuard<'_, MergeBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AggregationEngine {
    pool: WorkerPool,
    normalizer: RecordNormalizer,
    default_timeout: Option<Duration>,
}

impl AggregationEngine {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            pool,
            normalizer: RecordNormalizer::new(),
            default_timeout: None,
        }
    }

    /// Timeout applied to adapters that do not set their own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub async fn aggregate(
        &self,
        request: &SearchRequest,
        adapters: &[Arc<dyn SourceAdapter>],
    ) -> Result<AggregatedResult, AggregateError> {
        self.aggregate_with_cancel(request, adapters, CancellationToken::new())
            .await
    }

    /// Like [`aggregate`](Self::aggregate); once `cancel` fires, every source
    /// still waiting or running settles as `"cancelled"`.
    pub async fn aggregate_with_cancel(
        &self,
        request: &SearchRequest,
        adapters: &[Arc<dyn SourceAdapter>],
        cancel: CancellationToken,
    ) -> Result<AggregatedResult, AggregateError> {
        if self.pool.is_shut_down() {
            return Err(AggregateError::PoolShutDown(PoolClosed));
        }

        let t0 = Instant::now();
        counter!("aggregate_requests_total").increment(1);

        let buffer = Arc::new(Mutex::new(MergeBuffer::default()));
        let mut tasks = JoinSet::new();

        for source in request.sources() {
            let Some(adapter) = adapters.iter().find(|a| a.id() == source).cloned() else {
                lock(&buffer).record_error(source.clone(), &SourceFailure::NotConfigured);
                continue;
            };

            let source = source.clone();
            let pool = self.pool.clone();
            let request = request.for_source(&source);
            let buffer = Arc::clone(&buffer);
            let cancel = cancel.clone();
            let normalizer = self.normalizer;
            let timeout = adapter.timeout().or(self.default_timeout);

            tasks.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(SourceFailure::Cancelled),
                    res = run_source(&pool, adapter.as_ref(), &request, timeout) => res,
                };
                match outcome {
                    Ok(rows) => {
                        let records: Vec<JobRecord> = rows
                            .into_iter()
                            .map(|row| normalizer.normalize(&source, row))
                            .collect();
                        tracing::debug!(target: "aggregate", source = %source, records = records.len(), "source finished");
                        lock(&buffer).push_records(source, records);
                    }
                    Err(failure) => lock(&buffer).record_error(source, &failure),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(target: "aggregate", error = %e, "adapter task did not complete");
            }
        }

        let mut merged = std::mem::take(&mut *lock(&buffer));
        for source in request.sources() {
            if !merged.settled.contains(source) {
                merged.record_error(source.clone(), &SourceFailure::Panicked);
            }
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        let elapsed_ms = ms as u64;
        histogram!("aggregate_duration_ms").record(ms);
        counter!("aggregate_records_total").increment(merged.records.len() as u64);
        tracing::info!(
            target: "aggregate",
            search_term = request.search_term(),
            sources = request.sources().len(),
            records = merged.records.len(),
            failed = merged.errors.len(),
            elapsed_ms,
            "aggregation finished"
        );

        Ok(AggregatedResult::new(
            merged.records,
            request.search_term(),
            request.location().map(str::to_string),
            merged.errors,
        ))
    }
}

/// One adapter call: wait for a pool slot, then scrape under the timeout.
async fn run_source(
    pool: &WorkerPool,
    adapter: &dyn SourceAdapter,
    request: &SearchRequest,
    timeout: Option<Duration>,
) -> Result<Vec<RawRow>, SourceFailure> {
    let _permit = pool.acquire().await.map_err(|_| SourceFailure::PoolClosed)?;
    let call = adapter.scrape(request);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| SourceFailure::TimedOut(limit))?
            .map_err(SourceFailure::Adapter),
        None => call.await.map_err(SourceFailure::Adapter),
    }
}
