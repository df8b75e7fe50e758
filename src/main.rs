//! # Proxy Bot
//!
//! Message proxying service for plural systems.
//!
//! This is the application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Database connection pool
//! - Redis channel cache and event subscription
//! - Health/metrics HTTP server

use anyhow::Result;
use tracing::info;

use proxy_bot::config::Settings;
use proxy_bot::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    proxy_bot::telemetry::init_tracing(settings.telemetry.json);

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        event_channel = %settings.redis.event_channel,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Proxy bot ready");
    application.run_until_stopped().await?;

    Ok(())
}
