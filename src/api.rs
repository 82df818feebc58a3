use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
        },
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{StatusConfig, DEFAULT_CACHE_MAX_AGE_SECS};
use crate::pipeline::Pipeline;
use crate::response;

pub const STATUS_PATH: &str = "/api/gt-status";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub cache_max_age_secs: u64,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
        }
    }

    pub fn from_config(cfg: &StatusConfig) -> anyhow::Result<Self> {
        let pipeline = Pipeline::from_config(cfg)?;
        Ok(Self::new(pipeline).with_cache_max_age(cfg.cache_max_age_secs))
    }

    pub fn with_cache_max_age(mut self, secs: u64) -> Self {
        self.cache_max_age_secs = secs;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(STATUS_PATH, any(gt_status))
        // Innermost, so the 500 still passes through the CORS headers below.
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn gt_status(State(state): State<AppState>, method: Method) -> Response {
    match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::GET => {
            let outcome = state.pipeline.resolve().await;
            let (code, body) = response::format(outcome, chrono::Utc::now());
            let mut resp = (code, Json(body)).into_response();
            if code == StatusCode::OK {
                let directive = cache_directive(state.cache_max_age_secs);
                if let Ok(v) = HeaderValue::from_str(&directive) {
                    resp.headers_mut().insert(CACHE_CONTROL, v);
                }
            }
            resp
        }
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": "Method not allowed" })),
        )
            .into_response(),
    }
}

/// Edge cache for `secs`, then serve stale for another `secs` while revalidating.
pub fn cache_directive(secs: u64) -> String {
    format!("public, s-maxage={secs}, stale-while-revalidate={secs}")
}

fn internal_error(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "status handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal server error" })),
    )
        .into_response()
}
