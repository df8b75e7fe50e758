//! Per-message context and repository trait.
//!
//! Everything the pipeline needs to know about the author's system and the
//! guild, loaded once per inbound message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Autoproxy mode in effect for an author in a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "member", rename_all = "snake_case")]
pub enum AutoproxyMode {
    #[default]
    Off,
    /// First current fronter
    Front,
    /// Member of the author's previous proxied message in the channel
    Latch,
    /// A specific member
    Member(i64),
}

impl AutoproxyMode {
    /// Build from the stored `(mode, member)` pair.
    ///
    /// Stored modes: 1 = off, 2 = front, 3 = latch, 4 = member. A member mode
    /// without a member falls back to off.
    pub fn from_db(mode: i32, member: Option<i64>) -> Self {
        match (mode, member) {
            (2, _) => Self::Front,
            (3, _) => Self::Latch,
            (4, Some(id)) => Self::Member(id),
            _ => Self::Off,
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }
}

/// The author's most recent proxied message in the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub message_id: i64,
    pub member_id: i64,
}

/// Snapshot of system and guild settings for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageContext {
    /// System linked to the author, if any
    pub system_id: Option<i64>,

    /// Tag appended to proxy names
    pub system_tag: Option<String>,

    /// Fallback avatar for members without one
    pub system_avatar: Option<String>,

    /// Whether the system tag is shown in this guild
    pub tag_enabled: bool,

    /// Whether the system has proxying enabled in this guild
    pub proxy_enabled: bool,

    /// Whether the channel is on the guild's proxy blacklist
    pub in_blacklist: bool,

    /// Guild log channel
    pub log_channel: Option<i64>,

    /// Whether the channel is excluded from logging
    pub in_log_blacklist: bool,

    pub autoproxy_mode: AutoproxyMode,

    pub last_message: Option<LastMessage>,

    /// Members in the latest switch, first is the primary fronter
    pub fronters: Vec<i64>,
}

/// Repository trait for loading [`MessageContext`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageContextRepository: Send + Sync {
    async fn load_context(
        &self,
        account_id: i64,
        guild_id: i64,
        channel_id: i64,
    ) -> Result<MessageContext, AppError>;
}
