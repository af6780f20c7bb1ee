// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("aggregate_requests_total", "Searches dispatched to sources.");
        describe_counter!(
            "aggregate_source_errors_total",
            "Sources that failed entirely, by source."
        );
        describe_counter!("aggregate_records_total", "Records merged across sources.");
        describe_histogram!("aggregate_duration_ms", "Wall time of one aggregation in milliseconds.");
        describe_counter!("normalize_records_total", "Rows normalized into job records.");
        describe_counter!(
            "normalize_field_anomalies_total",
            "Fields degraded to unknown because they could not be coerced."
        );
        describe_counter!(
            "source_malformed_rows_total",
            "Upstream rows skipped because they were not objects."
        );

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
