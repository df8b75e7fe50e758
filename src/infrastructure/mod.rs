//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL)
//! - Channel cache and gateway event subscription (Redis)
//! - Chat platform REST and webhook clients
//! - Log channel writer
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod discord;
pub mod log_channel;
pub mod metrics;
pub mod repositories;
