//! Channel Cache
//!
//! Channel type and bot permissions, written as JSON by the gateway process
//! under `{prefix}{channel_id}`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use super::keys;
use crate::domain::{CachedChannel, ChannelCache};
use crate::shared::error::AppError;

/// Redis-backed [`ChannelCache`].
#[derive(Clone)]
pub struct RedisChannelCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisChannelCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn parse(data: &str) -> Result<CachedChannel, AppError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[async_trait]
impl ChannelCache for RedisChannelCache {
    #[instrument(skip(self), level = "debug")]
    async fn get_channel(&self, channel_id: i64) -> Result<Option<CachedChannel>, AppError> {
        let key = keys::channel(&self.prefix, channel_id);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&key).await?;

        match result {
            Some(data) => {
                debug!(key = %key, "Cache hit");
                Ok(Some(Self::parse(&data)?))
            }
            None => {
                debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }
}
