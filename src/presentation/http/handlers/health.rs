//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Version and a static status
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe over PostgreSQL and Redis
//!
//! Readiness only fails on PostgreSQL. Without Redis no new gateway events
//! arrive, but pipelines already running can still record and clean up.

use std::future::Future;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::infrastructure::{cache, database, metrics};
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Service readiness derived from its backing stores.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    /// Redis is down; no new events, cleanup still works
    Degraded,
    /// PostgreSQL is down; no proxy can be matched or recorded
    Unavailable,
}

impl Readiness {
    pub fn of(database_up: bool, redis_up: bool) -> Self {
        match (database_up, redis_up) {
            (false, _) => Self::Unavailable,
            (true, false) => Self::Degraded,
            (true, true) => Self::Ready,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ready | Self::Degraded => StatusCode::OK,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Result of pinging one store.
#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreCheck {
    async fn run<F, E>(ping: F) -> Self
    where
        F: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        match ping.await {
            Ok(()) => Self {
                up: true,
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                up: false,
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: Readiness,
    pub database: StoreCheck,
    pub redis: StoreCheck,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe, 503 when PostgreSQL is unreachable.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = StoreCheck::run(database::ping(&state.db)).await;
    let redis = StoreCheck::run(cache::ping(&state.redis)).await;

    let idle = state.db.num_idle() as u32;
    metrics::update_db_pool_stats(
        idle,
        state.db.size().saturating_sub(idle),
        state.settings.database.max_connections,
    );

    let status = Readiness::of(database.up, redis.up);
    (
        status.status_code(),
        Json(ReadinessResponse {
            status,
            database,
            redis,
        }),
    )
}
