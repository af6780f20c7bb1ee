// src/sources/http.rs
//! Adapter that delegates scraping of one site to an upstream HTTP endpoint.
//!
//! The endpoint receives the search request as JSON and answers with either a
//! bare array of row objects or `{ "jobs": [...] }`.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::search::SearchRequest;
use crate::sources::types::{row_from_json, RawRow, SourceAdapter, SourceId};

pub struct HttpSourceAdapter {
    id: SourceId,
    url: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl HttpSourceAdapter {
    pub fn new(id: SourceId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Split an upstream payload into rows, skipping entries that are not objects.
pub(crate) fn rows_from_payload(source: &SourceId, payload: serde_json::Value) -> Result<Vec<RawRow>> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("jobs") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(anyhow!("upstream payload has no `jobs` array")),
        },
        other => return Err(anyhow!("unexpected upstream payload: {}", kind_of(&other))),
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match row_from_json(item) {
            Some(row) => rows.push(row),
            None => {
                tracing::debug!(source = %source, "skipping non-object row");
                counter!("source_malformed_rows_total", "source" => source.to_string())
                    .increment(1);
            }
        }
    }
    Ok(rows)
}

fn kind_of(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[async_trait]
impl SourceAdapter for HttpSourceAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    async fn scrape(&self, request: &SearchRequest) -> Result<Vec<RawRow>> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("{} http post", self.id))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("{} upstream returned {}", self.id, status));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("{} decoding upstream json", self.id))?;
        rows_from_payload(&self.id, payload)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
