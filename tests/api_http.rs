// tests/api_http.rs
//
// HTTP-level tests for the status router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - OPTIONS preflight
// - method gate (POST/DELETE -> 405, no strategy invoked)
// - GET success / failure envelopes, CORS + cache headers
// - GET /health
// - panic inside a strategy -> generic 500, CORS headers intact

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use gt_status::api::STATUS_PATH;
use gt_status::{router, AppState, Deadline, FetchError, Pipeline, SourceStrategy};

const BODY_LIMIT: usize = 1024 * 1024;

struct Canned {
    name: &'static str,
    result: Result<Value, FetchError>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceStrategy for Canned {
    fn name(&self) -> &str {
        self.name
    }
    fn timeout(&self) -> Duration {
        Duration::from_millis(100)
    }
    async fn fetch(&self, _deadline: &Deadline) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Router over canned strategies; returns the shared call counter too.
fn test_router(results: Vec<(&'static str, Result<Value, FetchError>)>) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let strategies = results
        .into_iter()
        .map(|(name, result)| {
            Arc::new(Canned {
                name,
                result,
                calls: calls.clone(),
            }) as gt_status::DynStrategy
        })
        .collect();
    let state = AppState::new(Pipeline::new(strategies));
    (router(state), calls)
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn read_json(resp: axum::response::Response) -> Value {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn header<'a>(resp: &'a axum::response::Response, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn options_is_200_with_empty_body_and_no_fetch() {
    let (app, calls) = test_router(vec![("direct", Err(FetchError::Timeout))]);

    let resp = app.oneshot(request("OPTIONS", STATUS_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-origin"), "*");
    assert_eq!(header(&resp, "access-control-allow-methods"), "GET, OPTIONS");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert!(bytes.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_is_405_and_never_touches_strategies() {
    let (app, calls) = test_router(vec![("direct", Ok(json!({ "online_user": 1 })))]);

    let resp = app
        .clone()
        .oneshot(request("POST", STATUS_PATH))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(header(&resp, "access-control-allow-origin"), "*");
    assert_eq!(read_json(resp).await, json!({ "error": "Method not allowed" }));

    let resp = app.oneshot(request("DELETE", STATUS_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn get_success_returns_envelope_with_source_and_cache_header() {
    let (app, _) = test_router(vec![
        ("direct", Err(FetchError::HttpStatus(500))),
        ("allorigins", Ok(json!({ "online_user": 120, "extra": "kept" }))),
    ]);

    let resp = app.oneshot(request("GET", STATUS_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-origin"), "*");
    assert_eq!(header(&resp, "access-control-allow-headers"), "Content-Type");
    let cache = header(&resp, "cache-control").to_string();
    assert!(cache.contains("s-maxage=10"), "cache-control: {cache}");
    assert!(cache.contains("stale-while-revalidate=10"), "cache-control: {cache}");

    let v = read_json(resp).await;
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["source"], json!("allorigins"));
    assert_eq!(v["data"], json!({ "online_user": 120, "extra": "kept" }));
    assert!(v["elapsed_ms"].is_u64());
    let ts = v["timestamp"].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad ts {ts}");
}

#[tokio::test]
async fn get_failure_is_503_with_ordered_attempts() {
    let (app, calls) = test_router(vec![
        ("direct", Err(FetchError::HttpStatus(403))),
        ("allorigins", Ok(json!({}))),
        ("corsproxy", Err(FetchError::Timeout)),
    ]);

    let resp = app.oneshot(request("GET", STATUS_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(header(&resp, "access-control-allow-origin"), "*");
    assert!(resp.headers().get("cache-control").is_none());

    let v = read_json(resp).await;
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["error"], json!("All fetch methods failed"));
    assert_eq!(
        v["attempts"],
        json!([
            "direct: HTTP error! status: 403",
            "allorigins: invalid shape",
            "corsproxy: timeout"
        ])
    );
    assert!(v["timestamp"].is_string());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cache_window_follows_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let strategy = Arc::new(Canned {
        name: "direct",
        result: Ok(json!({ "online_user": 0 })),
        calls,
    }) as gt_status::DynStrategy;
    let state = AppState::new(Pipeline::new(vec![strategy])).with_cache_max_age(30);

    let resp = router(state)
        .oneshot(request("GET", STATUS_PATH))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "cache-control").contains("s-maxage=30"));
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = test_router(vec![]);
    let resp = app.oneshot(request("GET", "/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "OK");
}

struct Exploding;

#[async_trait]
impl SourceStrategy for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }
    fn timeout(&self) -> Duration {
        Duration::from_millis(100)
    }
    async fn fetch(&self, _deadline: &Deadline) -> Result<Value, FetchError> {
        panic!("secret detail from inside the strategy");
    }
}

#[tokio::test]
async fn panicking_strategy_becomes_generic_500_with_cors() {
    let strategy = Arc::new(Exploding) as gt_status::DynStrategy;
    let app = router(AppState::new(Pipeline::new(vec![strategy])));

    let resp = app.oneshot(request("GET", STATUS_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header(&resp, "access-control-allow-origin"), "*");
    assert_eq!(header(&resp, "access-control-allow-methods"), "GET, OPTIONS");
    assert_eq!(header(&resp, "access-control-allow-headers"), "Content-Type");
    assert!(resp.headers().get("cache-control").is_none());

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.contains("secret"), "panic detail leaked: {text}");
    let v: Value = serde_json::from_str(&text).expect("parse json");
    assert_eq!(v, json!({ "success": false, "error": "Internal server error" }));
}
