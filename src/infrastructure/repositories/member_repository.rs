//! Member Repository Implementation
//!
//! PostgreSQL implementation of the MemberRepository trait.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::domain::{MemberRepository, ProxyMember, ProxyTag};
use crate::shared::error::AppError;

/// Database row joining `members` with the guild-specific `member_guild` row.
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: i64,
    hid: String,
    name: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    proxy_tags: Option<serde_json::Value>,
    keep_proxy: bool,
    allow_autoproxy: bool,
    server_name: Option<String>,
    server_avatar: Option<String>,
}

impl MemberRow {
    fn into_member(self) -> ProxyMember {
        let proxy_tags = parse_proxy_tags(self.id, self.proxy_tags);
        ProxyMember {
            id: self.id,
            hid: self.hid,
            name: self.name,
            display_name: self.display_name,
            server_name: self.server_name,
            avatar_url: self.avatar_url,
            server_avatar: self.server_avatar,
            proxy_tags,
            keep_proxy: self.keep_proxy,
            allow_autoproxy: self.allow_autoproxy,
        }
    }
}

/// Parse the stored tag array, dropping entries with neither prefix nor suffix.
fn parse_proxy_tags(member_id: i64, raw: Option<serde_json::Value>) -> Vec<ProxyTag> {
    let Some(serde_json::Value::Array(items)) = raw else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ProxyTag>(item) {
            Ok(tag) => Some(tag),
            Err(e) => {
                warn!(member_id, error = %e, "Skipping invalid proxy tag");
                None
            }
        })
        .collect()
}

/// PostgreSQL member repository implementation.
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn find_proxy_members(
        &self,
        account_id: i64,
        guild_id: i64,
    ) -> Result<Vec<ProxyMember>, AppError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.id, m.hid, m.name, m.display_name, m.avatar_url, m.proxy_tags,
                   m.keep_proxy, m.allow_autoproxy,
                   mg.display_name AS server_name, mg.avatar_url AS server_avatar
            FROM accounts a
            JOIN members m ON m.system = a.system
            LEFT JOIN member_guild mg ON mg.member = m.id AND mg.guild = $2
            WHERE a.uid = $1
            ORDER BY m.id ASC
            "#,
        )
        .bind(account_id)
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }
}
