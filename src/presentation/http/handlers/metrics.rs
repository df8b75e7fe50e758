//! Prometheus metrics endpoint.

use axum::response::IntoResponse;

use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Prometheus metrics endpoint handler
pub async fn metrics_handler() -> Result<impl IntoResponse, AppError> {
    let metrics = metrics::gather_metrics()?;
    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    ))
}
