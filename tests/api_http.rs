// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - POST /search (partial success, validation, malformed body, total failure)
// - POST /export/csv (headers + body)
// - GET /sites, /job-types, /countries (also under /api)
// - client disconnect cancelling in-flight sources
// - CORS origin configuration

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use common::{titled_rows, ScriptedAdapter};
use job_aggregator::{api, AggregationEngine, AppState, SearchService, WorkerPool};
use job_aggregator::api::cors_layer;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn test_service() -> Arc<SearchService> {
    let adapters = vec![
        ScriptedAdapter::rows("indeed", titled_rows("indeed", 3)).shared(),
        ScriptedAdapter::failing("linkedin", "429 too many requests").shared(),
    ];
    let engine = AggregationEngine::new(WorkerPool::new(2));
    Arc::new(SearchService::new(engine, adapters))
}

fn test_router(service: Arc<SearchService>) -> Router {
    api::router(
        AppState::new(service),
        &["http://localhost:3000".to_string()],
    )
    .expect("valid CORS origins")
}

fn post_json(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

async fn read_body(resp: axum::response::Response) -> Vec<u8> {
    body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec()
}

#[tokio::test]
async fn search_returns_partial_results_with_200() {
    let app = test_router(test_service());

    let payload = json!({ "search_term": "engineer", "site_name": ["indeed", "linkedin"], "results_wanted": 10 });
    let resp = app.oneshot(post_json("/search", &payload)).await.expect("oneshot /search");
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_slice(&read_body(resp).await).expect("parse search json");
    assert_eq!(v["total"], 3);
    assert_eq!(v["jobs"].as_array().map(Vec::len), Some(3));
    assert_eq!(v["search_term"], "engineer");
    assert!(v["location"].is_null());
    assert_eq!(v["source_errors"]["linkedin"], "429 too many requests");
    // unknown fields are explicit nulls
    assert!(v["jobs"][0]["min_amount"].is_null());
}

#[tokio::test]
async fn search_defaults_to_registered_sources() {
    let app = test_router(test_service());

    let resp = app
        .oneshot(post_json("/api/search", &json!({ "search_term": "engineer" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(v["total"], 3);
    assert!(v["source_errors"].get("linkedin").is_some());
}

#[tokio::test]
async fn results_wanted_zero_is_a_400_naming_the_field() {
    let app = test_router(test_service());

    let payload = json!({ "search_term": "engineer", "results_wanted": 0, "distance": 900 });
    let resp = app.oneshot(post_json("/search", &payload)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(v["error"], "validation_failed");
    let fields: Vec<&str> = v["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .filter_map(|x| x["field"].as_str())
        .collect();
    assert!(fields.contains(&"results_wanted"), "fields: {fields:?}");
    assert!(fields.contains(&"distance"), "fields: {fields:?}");
}

#[tokio::test]
async fn malformed_body_is_a_400() {
    let app = test_router(test_service());

    let req = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(v["violations"][0]["field"], "body");
}

#[tokio::test]
async fn shut_down_service_is_a_500() {
    let service = test_service();
    service.shutdown();
    let app = test_router(service);

    let resp = app
        .oneshot(post_json("/search", &json!({ "search_term": "engineer" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(v["error"], "aggregation_unavailable");
}

#[tokio::test]
async fn export_csv_streams_an_attachment() {
    let app = test_router(test_service());

    let payload = json!({ "search_term": "engineer", "site_name": ["indeed", "linkedin"] });
    let resp = app.oneshot(post_json("/export/csv", &payload)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers().clone();
    let ct = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(ct.starts_with("text/csv"), "content-type was '{ct}'");
    let cd = headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert_eq!(cd, "attachment; filename=jobs.csv");
    assert_eq!(
        headers.get("x-source-errors").and_then(|h| h.to_str().ok()),
        Some("linkedin")
    );

    let text = String::from_utf8(read_body(resp).await).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,site,job_url,"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn lookup_tables_are_served() {
    let app = test_router(test_service());

    for (uri, expected_first) in [
        ("/sites", "linkedin"),
        ("/api/job-types", "fulltime"),
        ("/countries", "argentina"),
    ] {
        let resp = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
        assert_eq!(v[0]["value"], expected_first, "{uri}");
        assert!(v[0]["label"].is_string());
    }
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_router(test_service());
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, b"ok");
}

#[tokio::test]
async fn mistyped_fields_are_reported_with_the_others() {
    let app = test_router(test_service());

    let payload = json!({ "search_term": "", "results_wanted": "ten", "distance": 900 });
    let resp = app.oneshot(post_json("/search", &payload)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v: Json = serde_json::from_slice(&read_body(resp).await).unwrap();
    let fields: Vec<&str> = v["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .filter_map(|x| x["field"].as_str())
        .collect();
    for field in ["search_term", "results_wanted", "distance"] {
        assert!(fields.contains(&field), "fields: {fields:?}");
    }
    assert!(!fields.contains(&"body"), "fields: {fields:?}");
}

#[tokio::test]
async fn numeric_strings_are_accepted() {
    let app = test_router(test_service());

    let payload = json!({ "search_term": "engineer", "site_name": ["indeed"], "results_wanted": "10" });
    let resp = app.oneshot(post_json("/search", &payload)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn client_disconnect_cancels_running_sources() {
    let abandoned = Arc::new(AtomicBool::new(false));
    let pool = WorkerPool::new(1);
    let adapters = vec![ScriptedAdapter::rows("indeed", titled_rows("indeed", 1))
        .delayed(Duration::from_secs(30))
        .flag_abandoned(Arc::clone(&abandoned))
        .shared()];
    let service = Arc::new(SearchService::new(
        AggregationEngine::new(pool.clone()),
        adapters,
    ));
    let app = test_router(service);

    // the caller gives up while the adapter is still scraping
    let pending = app.oneshot(post_json("/search", &json!({ "search_term": "engineer" })));
    assert!(tokio::time::timeout(Duration::from_millis(100), pending)
        .await
        .is_err());

    for _ in 0..100 {
        if abandoned.load(Ordering::SeqCst) && pool.in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(abandoned.load(Ordering::SeqCst), "scrape was never dropped");
    assert_eq!(pool.in_flight(), 0, "permit was not returned");
}

#[test]
fn cors_wildcard_is_accepted_alone_and_rejected_when_mixed() {
    assert!(cors_layer(&["*".to_string()]).is_ok());
    assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());

    let mixed = cors_layer(&["*".to_string(), "http://localhost:3000".to_string()]).unwrap_err();
    assert!(mixed.to_string().contains('*'), "got {mixed}");

    let bad = cors_layer(&["http://bad\norigin".to_string()]).unwrap_err();
    assert!(bad.to_string().contains("invalid CORS origin"), "got {bad}");
}

#[tokio::test]
async fn wildcard_origin_answers_any_caller() {
    let app = api::router(AppState::new(test_service()), &["*".to_string()]).unwrap();

    let resp = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://anywhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|h| h.to_str().ok()),
        Some("*")
    );
}
