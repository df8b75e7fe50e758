//! Application Startup
//!
//! Wires the ports to their PostgreSQL, Redis and REST implementations and
//! runs the event loop alongside the health/metrics server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::application::services::{ProxyPorts, ProxyService};
use crate::config::Settings;
use crate::domain::platform::ChannelClient;
use crate::infrastructure::cache::{self, RedisChannelCache, RedisEventSubscriber};
use crate::infrastructure::database;
use crate::infrastructure::discord::{DiscordRestClient, WebhookExecutor};
use crate::infrastructure::log_channel::LogChannelService;
use crate::infrastructure::repositories::{
    PgMemberRepository, PgMessageContextRepository, PgProxiedMessageRepository,
};
use crate::presentation::gateway::EventDispatcher;
use crate::presentation::http::{create_trace_layer, routes};

/// Buffered gateway payloads between the subscriber and the dispatcher
const EVENT_BUFFER: usize = 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    dispatcher: Arc<EventDispatcher>,
    proxy: ProxyService,
    subscriber: RedisEventSubscriber,
    settings: Arc<Settings>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let settings = Arc::new(settings);

        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        info!("Database connection pool created");

        // Create Redis client
        let redis = cache::create_redis_client(&settings.redis).await?;

        let rest = DiscordRestClient::new(&settings.discord)?;
        let channel_client: Arc<dyn ChannelClient> = Arc::new(rest.clone());

        let ports = ProxyPorts {
            members: Arc::new(PgMemberRepository::new(db.clone())),
            messages: Arc::new(PgProxiedMessageRepository::new(db.clone())),
            webhooks: Arc::new(WebhookExecutor::new(rest, settings.proxy.webhook_name.clone())),
            channels: Arc::clone(&channel_client),
            audit: Arc::new(LogChannelService::new(channel_client)),
        };
        let proxy = ProxyService::new(ports, settings.proxy.clone(), settings.emojis.clone());

        let dispatcher = Arc::new(EventDispatcher::new(
            proxy.clone(),
            Arc::new(RedisChannelCache::new(
                redis.clone(),
                settings.redis.channel_key_prefix.clone(),
            )),
            Arc::new(PgMessageContextRepository::new(db.clone())),
        ));
        let subscriber =
            RedisEventSubscriber::new(&settings.redis.url, settings.redis.event_channel.clone())?;

        let state = AppState {
            db,
            redis,
            settings: Arc::clone(&settings),
        };
        let router = routes::create_router(state).layer(create_trace_layer());

        let addr = settings.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            dispatcher,
            proxy,
            subscriber,
            settings,
        })
    }

    /// Run until Ctrl-C, then drain in-flight pipelines.
    pub async fn run_until_stopped(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let drain_timeout = Duration::from_secs(self.settings.shutdown.drain_timeout_secs);
        let completion_timeout =
            Duration::from_secs(self.settings.shutdown.completion_timeout_secs);

        let subscriber = tokio::spawn(self.subscriber.run(event_tx, shutdown_rx.clone()));
        let dispatcher = tokio::spawn(self.dispatcher.run(event_rx, drain_timeout));

        let mut http_shutdown = shutdown_rx;
        let server = axum::serve(self.listener, self.router).with_graceful_shutdown(async move {
            let _ = http_shutdown.changed().await;
        });
        let server = tokio::spawn(async move { server.await });

        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);

        // The subscriber drops its sender on exit, which ends the dispatcher.
        subscriber.await?;
        dispatcher.await?;

        // Drained callers may have been cancelled after sending; their
        // cleanup still owes a trigger deletion.
        info!(
            pending = self.proxy.pending_completions(),
            "Waiting for sent proxies to finish"
        );
        if tokio::time::timeout(completion_timeout, self.proxy.wait_for_completions())
            .await
            .is_err()
        {
            warn!(
                pending = self.proxy.pending_completions(),
                "Sent proxies still running at shutdown, trigger messages may remain"
            );
        }

        server.await??;

        info!("Shutdown complete");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
