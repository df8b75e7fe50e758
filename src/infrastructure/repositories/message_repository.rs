//! Proxied Message Repository Implementation
//!
//! Appends trigger-to-proxy linkage rows to the `messages` table.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{ProxiedMessage, ProxiedMessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL proxied message repository implementation.
#[derive(Clone)]
pub struct PgProxiedMessageRepository {
    pool: PgPool,
}

impl PgProxiedMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProxiedMessageRepository for PgProxiedMessageRepository {
    /// Single-row insert, so a latch lookup never sees a partial row.
    async fn record(&self, message: &ProxiedMessage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO messages (mid, original_mid, sender, guild, channel, member)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.proxy_message_id)
        .bind(message.trigger_message_id)
        .bind(message.author_id)
        .bind(message.guild_id)
        .bind(message.channel_id)
        .bind(message.member_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
