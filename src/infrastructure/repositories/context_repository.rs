//! Message Context Repository Implementation
//!
//! Loads everything the proxy pipeline needs to know about an author's
//! system and the guild a message was sent in.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{AutoproxyMode, LastMessage, MessageContext, MessageContextRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SystemRow {
    system_id: i64,
    system_tag: Option<String>,
    guild_tag: Option<String>,
    system_avatar: Option<String>,
    proxy_enabled: bool,
    tag_enabled: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ServerRow {
    log_channel: Option<i64>,
    in_blacklist: bool,
    in_log_blacklist: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct AutoproxyRow {
    autoproxy_mode: i32,
    autoproxy_member: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct LastMessageRow {
    mid: i64,
    member: i64,
}

/// PostgreSQL message context repository implementation.
#[derive(Clone)]
pub struct PgMessageContextRepository {
    pool: PgPool,
}

impl PgMessageContextRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_system(&self, account_id: i64, guild_id: i64) -> Result<Option<SystemRow>, AppError> {
        let row = sqlx::query_as::<_, SystemRow>(
            r#"
            SELECT s.id AS system_id, s.tag AS system_tag, sg.tag AS guild_tag,
                   s.avatar_url AS system_avatar,
                   COALESCE(sg.proxy_enabled, TRUE) AS proxy_enabled,
                   COALESCE(sg.tag_enabled, TRUE) AS tag_enabled
            FROM accounts a
            JOIN systems s ON s.id = a.system
            LEFT JOIN system_guild sg ON sg.system = s.id AND sg.guild = $2
            WHERE a.uid = $1
            "#,
        )
        .bind(account_id)
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_server(&self, guild_id: i64, channel_id: i64) -> Result<Option<ServerRow>, AppError> {
        let row = sqlx::query_as::<_, ServerRow>(
            r#"
            SELECT log_channel,
                   COALESCE($2 = ANY(blacklist), FALSE) AS in_blacklist,
                   COALESCE($2 = ANY(log_blacklist), FALSE) AS in_log_blacklist
            FROM servers
            WHERE id = $1
            "#,
        )
        .bind(guild_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_autoproxy(&self, system_id: i64, guild_id: i64) -> Result<AutoproxyMode, AppError> {
        let row = sqlx::query_as::<_, AutoproxyRow>(
            r#"
            SELECT autoproxy_mode, autoproxy_member
            FROM autoproxy
            WHERE system = $1 AND guild = $2
            "#,
        )
        .bind(system_id)
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| AutoproxyMode::from_db(r.autoproxy_mode, r.autoproxy_member))
            .unwrap_or_default())
    }

    async fn find_last_message(
        &self,
        account_id: i64,
        channel_id: i64,
    ) -> Result<Option<LastMessage>, AppError> {
        let row = sqlx::query_as::<_, LastMessageRow>(
            r#"
            SELECT mid, member
            FROM messages
            WHERE sender = $1 AND channel = $2
            ORDER BY mid DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LastMessage {
            message_id: r.mid,
            member_id: r.member,
        }))
    }

    /// Members of the latest switch, primary fronter first.
    async fn find_fronters(&self, system_id: i64) -> Result<Vec<i64>, AppError> {
        let members = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT sm.member
            FROM switch_members sm
            WHERE sm.switch = (
                SELECT id FROM switches
                WHERE system = $1
                ORDER BY timestamp DESC
                LIMIT 1
            )
            ORDER BY sm.id ASC
            "#,
        )
        .bind(system_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}

#[async_trait]
impl MessageContextRepository for PgMessageContextRepository {
    async fn load_context(
        &self,
        account_id: i64,
        guild_id: i64,
        channel_id: i64,
    ) -> Result<MessageContext, AppError> {
        let Some(system) = self.find_system(account_id, guild_id).await? else {
            return Ok(MessageContext::default());
        };

        let server = self.find_server(guild_id, channel_id).await?;
        let autoproxy_mode = self.find_autoproxy(system.system_id, guild_id).await?;

        let last_message = if matches!(autoproxy_mode, AutoproxyMode::Latch) {
            self.find_last_message(account_id, channel_id).await?
        } else {
            None
        };
        let fronters = if matches!(autoproxy_mode, AutoproxyMode::Front) {
            self.find_fronters(system.system_id).await?
        } else {
            Vec::new()
        };

        Ok(MessageContext {
            system_id: Some(system.system_id),
            system_tag: system.guild_tag.or(system.system_tag),
            system_avatar: system.system_avatar,
            tag_enabled: system.tag_enabled,
            proxy_enabled: system.proxy_enabled,
            in_blacklist: server.as_ref().is_some_and(|s| s.in_blacklist),
            log_channel: server.as_ref().and_then(|s| s.log_channel),
            in_log_blacklist: server.as_ref().is_some_and(|s| s.in_log_blacklist),
            autoproxy_mode,
            last_message,
            fronters,
        })
    }
}
