//! Operational HTTP endpoint tests.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use proxy_bot::infrastructure::metrics;
use proxy_bot::presentation::http::handlers;

/// Routes that need no database or cache.
fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/metrics", get(handlers::metrics::metrics_handler))
}

async fn get_body(uri: &str) -> (StatusCode, String) {
    let response = router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_reports_version() {
    let (status, body) = get_body("/health").await;
    let json: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn liveness_is_alive() {
    let (status, body) = get_body("/health/live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"alive"}"#);
}

#[tokio::test]
async fn metrics_exposes_pipeline_counters() {
    metrics::record_pipeline_outcome("deleted");

    let (status, body) = get_body("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("proxy_bot_proxy_pipeline_outcomes_total"));
}
