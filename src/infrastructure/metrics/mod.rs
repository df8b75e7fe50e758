//! Prometheus Metrics Module
//!
//! Provides service-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Proxy pipeline outcomes by terminal stage
//! - Gateway events by event name
//! - Webhook execute latency histograms
//! - Database connection pool gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::shared::error::AppError;

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Pipeline runs by the stage they ended in ("deleted", "no_match", ...)
pub static PROXY_PIPELINE_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "proxy_pipeline_outcomes_total",
            "Proxy pipeline runs by terminal stage",
        )
        .namespace("proxy_bot"),
        &["stage"],
    )
    .expect("Failed to create PROXY_PIPELINE_OUTCOMES_TOTAL metric")
});

/// Gateway events received, including unknown ones
pub static GATEWAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gateway_events_total", "Gateway events received by type")
            .namespace("proxy_bot"),
        &["event"],
    )
    .expect("Failed to create GATEWAY_EVENTS_TOTAL metric")
});

/// Webhook execute latency, including attachment downloads and one retry
pub static WEBHOOK_EXECUTE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0];
    HistogramVec::new(
        HistogramOpts::new(
            "webhook_execute_duration_seconds",
            "Webhook execute latency in seconds",
        )
        .namespace("proxy_bot")
        .buckets(buckets),
        &["outcome"],
    )
    .expect("Failed to create WEBHOOK_EXECUTE_DURATION_SECONDS metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics").namespace("proxy_bot"),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(PROXY_PIPELINE_OUTCOMES_TOTAL.clone()))
        .expect("Failed to register PROXY_PIPELINE_OUTCOMES_TOTAL");
    registry
        .register(Box::new(GATEWAY_EVENTS_TOTAL.clone()))
        .expect("Failed to register GATEWAY_EVENTS_TOTAL");
    registry
        .register(Box::new(WEBHOOK_EXECUTE_DURATION_SECONDS.clone()))
        .expect("Failed to register WEBHOOK_EXECUTE_DURATION_SECONDS");
    registry
        .register(Box::new(DB_POOL_CONNECTIONS.clone()))
        .expect("Failed to register DB_POOL_CONNECTIONS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| AppError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

/// Helper to record the stage a pipeline run ended in
pub fn record_pipeline_outcome(stage: &str) {
    PROXY_PIPELINE_OUTCOMES_TOTAL.with_label_values(&[stage]).inc();
}

/// Helper to record a received gateway event
pub fn record_gateway_event(event: &str) {
    GATEWAY_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Helper to record webhook execute metrics
pub fn record_webhook_execute(success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "error" };
    WEBHOOK_EXECUTE_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}
