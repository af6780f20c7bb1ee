// tests/config_env.rs
use std::{env, fs, time::Duration};

use job_aggregator::config::{
    load_sources_from, ENV_ADAPTER_TIMEOUT_SECS, ENV_CORS_ORIGINS, ENV_SOURCES_CONFIG_PATH,
    ENV_WORKER_POOL_SIZE,
};
use job_aggregator::{build_service, AppConfig};

fn clear_env() {
    for k in [
        "BIND_ADDR",
        ENV_CORS_ORIGINS,
        ENV_WORKER_POOL_SIZE,
        ENV_ADAPTER_TIMEOUT_SECS,
        ENV_SOURCES_CONFIG_PATH,
    ] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn defaults_without_env() {
    clear_env();
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.worker_pool_size, 4);
    assert_eq!(cfg.adapter_timeout, Some(Duration::from_secs(60)));
    assert_eq!(cfg.cors_origins.len(), 2);
}

#[serial_test::serial]
#[test]
fn env_overrides_apply() {
    clear_env();
    env::set_var(ENV_WORKER_POOL_SIZE, "0");
    env::set_var(ENV_ADAPTER_TIMEOUT_SECS, "0");
    env::set_var(ENV_CORS_ORIGINS, "https://jobs.example");
    let cfg = AppConfig::from_env().unwrap();
    clear_env();

    assert_eq!(cfg.worker_pool_size, 1);
    assert_eq!(cfg.adapter_timeout, None);
    assert_eq!(cfg.cors_origins, vec!["https://jobs.example".to_string()]);
}

#[serial_test::serial]
#[test]
fn bad_numbers_are_errors() {
    clear_env();
    env::set_var(ENV_WORKER_POOL_SIZE, "many");
    let err = AppConfig::from_env().unwrap_err();
    clear_env();
    assert!(err.to_string().contains(ENV_WORKER_POOL_SIZE));
}

#[test]
fn sources_file_registers_adapters() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("sources.toml");
    fs::write(
        &p,
        r#"
[[sources]]
id = "indeed"
url = "http://127.0.0.1:9/indeed"

[[sources]]
id = "google"
url = "http://127.0.0.1:9/google"
timeout_secs = 5
"#,
    )
    .unwrap();

    let entries = load_sources_from(&p).unwrap();
    assert_eq!(entries.len(), 2);

    let cfg = AppConfig {
        sources_path: p,
        ..AppConfig::default()
    };
    let service = build_service(&cfg).unwrap();
    let ids: Vec<String> = service
        .registered_sources()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(ids, ["indeed", "google"]);
}

#[test]
fn missing_sources_file_is_an_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    let entries = load_sources_from(&dir.path().join("nope.toml")).unwrap();
    assert!(entries.is_empty());
}
