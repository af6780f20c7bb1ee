// tests/common/mod.rs
// Scripted source adapters shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use job_aggregator::search::Constraints;
use job_aggregator::{RawRow, RawValue, SearchInput, SearchRequest, SourceAdapter, SourceId};

/// Tracks how many adapter calls are running at once.
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sources each adapter call was addressed to, keyed by adapter id.
pub type SeenRequests = Arc<Mutex<Vec<(SourceId, Vec<SourceId>)>>>;

/// Set when a scrape future is dropped before it finished.
struct AbandonGuard {
    flag: Option<Arc<AtomicBool>>,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if let Some(flag) = self.flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

pub enum Script {
    Rows(Vec<RawRow>),
    Fail(String),
    Panic,
}

pub struct ScriptedAdapter {
    id: SourceId,
    script: Script,
    delay: Duration,
    timeout: Option<Duration>,
    in_flight: Option<Arc<InFlight>>,
    seen: Option<SeenRequests>,
    abandoned: Option<Arc<AtomicBool>>,
}

impl ScriptedAdapter {
    pub fn rows(id: &str, rows: Vec<RawRow>) -> Self {
        Self::new(id, Script::Rows(rows))
    }

    pub fn failing(id: &str, msg: &str) -> Self {
        Self::new(id, Script::Fail(msg.to_string()))
    }

    pub fn panicking(id: &str) -> Self {
        Self::new(id, Script::Panic)
    }

    fn new(id: &str, script: Script) -> Self {
        Self {
            id: SourceId::from(id),
            script,
            delay: Duration::ZERO,
            timeout: None,
            in_flight: None,
            seen: None,
            abandoned: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tracked(mut self, in_flight: Arc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    pub fn recording(mut self, seen: SeenRequests) -> Self {
        self.seen = Some(seen);
        self
    }

    pub fn flag_abandoned(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abandoned = Some(flag);
        self
    }

    pub fn shared(self) -> Arc<dyn SourceAdapter> {
        Arc::new(self)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn id(&self) -> &SourceId {
        &self.id
    }

    async fn scrape(&self, request: &SearchRequest) -> Result<Vec<RawRow>> {
        if let Some(seen) = &self.seen {
            seen.lock()
                .unwrap()
                .push((self.id.clone(), request.sources().to_vec()));
        }
        let mut guard = AbandonGuard {
            flag: self.abandoned.clone(),
        };
        if let Some(t) = &self.in_flight {
            t.enter();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(t) = &self.in_flight {
            t.exit();
        }
        guard.flag = None;
        match &self.script {
            Script::Rows(rows) => Ok(rows.clone()),
            Script::Fail(msg) => Err(anyhow!("{msg}")),
            Script::Panic => panic!("scripted adapter panic"),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

pub fn row(pairs: &[(&str, RawValue)]) -> RawRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// `n` simple rows titled `<prefix>-<i>`.
pub fn titled_rows(prefix: &str, n: usize) -> Vec<RawRow> {
    (0..n)
        .map(|i| {
            row(&[
                ("title", RawValue::from(format!("{prefix}-{i}"))),
                ("job_url", RawValue::from(format!("https://jobs.test/{prefix}/{i}"))),
            ])
        })
        .collect()
}

/// Validated request for arbitrary test source ids.
pub fn request(term: &str, sources: &[&str]) -> SearchRequest {
    let known: Vec<SourceId> = sources.iter().map(|s| SourceId::from(*s)).collect();
    SearchInput {
        search_term: Some(term.into()),
        site_name: Some(sources.iter().map(|s| s.to_string()).collect()),
        results_wanted: Some(10.into()),
        ..Default::default()
    }
    .validate(&Constraints {
        known_sources: &known,
        default_sources: &known,
        countries: &["usa"],
    })
    .expect("test request should validate")
}
