// src/config.rs
//! Runtime configuration: environment variables (optionally from `.env`)
//! plus a sources file that registers one HTTP adapter per job board.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::DEFAULT_POOL_SIZE;
use crate::sources::{HttpSourceAdapter, SourceAdapter, SourceId};

// --- env names & defaults ---
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_WORKER_POOL_SIZE: &str = "WORKER_POOL_SIZE";
pub const ENV_ADAPTER_TIMEOUT_SECS: &str = "ADAPTER_TIMEOUT_SECS";
pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub worker_pool_size: usize,
    /// `None` disables the default timeout.
    pub adapter_timeout: Option<Duration>,
    pub sources_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            worker_pool_size: DEFAULT_POOL_SIZE,
            adapter_timeout: Some(Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS)),
            sources_path: PathBuf::from(DEFAULT_SOURCES_CONFIG_PATH),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Read configuration from the process environment; unset vars use defaults.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(addr) = env_opt(ENV_BIND_ADDR) {
            cfg.bind_addr = addr
                .parse()
                .with_context(|| format!("{ENV_BIND_ADDR}='{addr}' is not a socket address"))?;
        }
        if let Some(origins) = env_opt(ENV_CORS_ORIGINS) {
            cfg.cors_origins = split_origins(&origins);
        }
        if let Some(size) = env_opt(ENV_WORKER_POOL_SIZE) {
            let n: usize = size
                .parse()
                .with_context(|| format!("{ENV_WORKER_POOL_SIZE}='{size}' is not a number"))?;
            cfg.worker_pool_size = n.max(1);
        }
        if let Some(secs) = env_opt(ENV_ADAPTER_TIMEOUT_SECS) {
            let n: u64 = secs
                .parse()
                .with_context(|| format!("{ENV_ADAPTER_TIMEOUT_SECS}='{secs}' is not a number"))?;
            cfg.adapter_timeout = (n > 0).then(|| Duration::from_secs(n));
        }
        if let Some(p) = env_opt(ENV_SOURCES_CONFIG_PATH) {
            cfg.sources_path = PathBuf::from(p);
        }

        Ok(cfg)
    }
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SourceEntry {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<SourceEntry>,
}

/// Load source entries from a TOML or JSON file. A missing file is an empty registry.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceEntry>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "sources file not found; no adapters registered");
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceEntry>> {
    let file: SourcesFile = if hint_ext == "json" {
        serde_json::from_str(s).context("parsing sources json")?
    } else {
        toml::from_str(s).context("parsing sources toml")?
    };
    clean_entries(file.sources)
}

fn clean_entries(items: Vec<SourceEntry>) -> Result<Vec<SourceEntry>> {
    let mut out: Vec<SourceEntry> = Vec::with_capacity(items.len());
    for mut it in items {
        it.id = it.id.trim().to_ascii_lowercase();
        it.url = it.url.trim().to_string();
        if it.id.is_empty() || it.url.is_empty() {
            return Err(anyhow!("source entry needs both `id` and `url`"));
        }
        if out.iter().any(|o| o.id == it.id) {
            return Err(anyhow!("source '{}' is configured twice", it.id));
        }
        out.push(it);
    }
    Ok(out)
}

pub fn build_adapters(entries: &[SourceEntry]) -> Vec<Arc<dyn SourceAdapter>> {
    entries
        .iter()
        .map(|e| {
            let adapter = HttpSourceAdapter::new(SourceId::new(e.id.clone()), e.url.clone())
                .with_timeout(e.timeout_secs.map(Duration::from_secs));
            Arc::new(adapter) as Arc<dyn SourceAdapter>
        })
        .collect()
}
