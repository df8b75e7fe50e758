//! Cache Module
//!
//! Redis access for the proxy service.
//!
//! This module provides:
//! - Redis connection management with automatic reconnection
//! - A `RedisChannelCache` reading channel records written by the gateway
//! - A `RedisEventSubscriber` forwarding gateway packets from pub/sub
//!
//! # Architecture
//!
//! ```text
//! +-------------------+        +-------------------+
//! |  Gateway process  | -----> |  Redis            |
//! +-------------------+  evt   +-------------------+
//!                                 |            |
//!                         pub/sub |            | channel:{id}
//!                                 v            v
//!                 +-----------------+   +-------------------+
//!                 | EventSubscriber |   | RedisChannelCache |
//!                 +-----------------+   +-------------------+
//! ```

mod channel_cache;
mod event_subscriber;

pub use channel_cache::RedisChannelCache;
pub use event_subscriber::RedisEventSubscriber;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
///
/// The connection manager handles connection pooling and automatic
/// reconnection when the connection is lost.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Round-trip a PING, used by the readiness check.
pub async fn ping(conn: &ConnectionManager) -> Result<(), redis::RedisError> {
    let mut conn = conn.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

/// Cache key helpers.
pub mod keys {
    /// Default prefix of cached channel records (e.g., "channel:channel_id")
    pub const CHANNEL: &str = "channel:";

    /// Generates a channel cache key under `prefix`
    #[inline]
    pub fn channel(prefix: &str, channel_id: impl std::fmt::Display) -> String {
        format!("{}{}", prefix, channel_id)
    }
}
