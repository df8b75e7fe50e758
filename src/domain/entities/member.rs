//! Proxy member entity, proxy tags and repository trait.
//!
//! Maps to the `members` table; proxy tags are stored as a JSONB array on
//! the member row.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::MessageContext;
use crate::shared::error::AppError;

/// A prefix/suffix pair that triggers proxying when it wraps a message.
///
/// At least one side is non-empty. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProxyTag")]
pub struct ProxyTag {
    prefix: Option<String>,
    suffix: Option<String>,
}

#[derive(Deserialize)]
struct RawProxyTag {
    prefix: Option<String>,
    suffix: Option<String>,
}

impl TryFrom<RawProxyTag> for ProxyTag {
    type Error = &'static str;

    fn try_from(raw: RawProxyTag) -> Result<Self, Self::Error> {
        ProxyTag::new(raw.prefix, raw.suffix).ok_or("proxy tag needs a prefix or a suffix")
    }
}

impl ProxyTag {
    /// Create a tag, returning `None` when both sides are empty.
    pub fn new(prefix: Option<String>, suffix: Option<String>) -> Option<Self> {
        let prefix = prefix.filter(|p| !p.is_empty());
        let suffix = suffix.filter(|s| !s.is_empty());
        if prefix.is_none() && suffix.is_none() {
            return None;
        }
        Some(Self { prefix, suffix })
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    pub fn suffix(&self) -> &str {
        self.suffix.as_deref().unwrap_or("")
    }

    /// Combined byte length of prefix and suffix.
    pub fn total_len(&self) -> usize {
        self.prefix().len() + self.suffix().len()
    }
}

impl std::fmt::Display for ProxyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}text{}", self.prefix(), self.suffix())
    }
}

/// A member as seen by the proxy pipeline.
///
/// Read-only snapshot loaded per message. Guild-specific fields
/// (`server_name`, `server_avatar`) are already resolved for the guild the
/// message was sent in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProxyMember {
    /// Member primary key
    pub id: i64,

    /// Short human-readable member ID
    pub hid: String,

    /// Canonical member name
    pub name: String,

    /// Optional display name, preferred over `name`
    pub display_name: Option<String>,

    /// Guild-specific display name, preferred over everything
    pub server_name: Option<String>,

    /// Member avatar
    pub avatar_url: Option<String>,

    /// Guild-specific avatar
    pub server_avatar: Option<String>,

    /// Proxy tags in registration order
    pub proxy_tags: Vec<ProxyTag>,

    /// Send the content with the matched tags still in place
    pub keep_proxy: bool,

    /// Whether autoproxy may select this member
    pub allow_autoproxy: bool,
}

impl ProxyMember {
    /// Name the replacement message is sent under.
    ///
    /// Guild name, then display name, then name; the system tag is appended
    /// when the system has one and it is enabled in this guild.
    pub fn proxy_name(&self, ctx: &MessageContext) -> String {
        let name = self
            .server_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.name);

        match ctx.system_tag.as_deref() {
            Some(tag) if ctx.tag_enabled && !tag.is_empty() => format!("{} {}", name, tag),
            _ => name.to_string(),
        }
    }

    /// Avatar the replacement message is sent with.
    pub fn proxy_avatar(&self, ctx: &MessageContext) -> Option<String> {
        self.server_avatar
            .clone()
            .or_else(|| self.avatar_url.clone())
            .or_else(|| ctx.system_avatar.clone())
    }
}

/// Repository trait for loading proxy candidates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// All members of the system linked to `account_id`, with guild-specific
    /// settings for `guild_id` applied, in registration order.
    async fn find_proxy_members(
        &self,
        account_id: i64,
        guild_id: i64,
    ) -> Result<Vec<ProxyMember>, AppError>;
}
