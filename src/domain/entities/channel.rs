//! Channel snapshot and cache trait.
//!
//! The pipeline never fetches channels itself: the gateway process keeps a
//! cached record per channel with the bot's computed permissions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{snowflake_str, snowflake_str_opt, Permissions};
use crate::shared::error::AppError;

/// Platform channel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    /// A text channel within a server
    #[default]
    GuildText,
    /// A direct message between two users
    Dm,
    /// A voice channel within a server
    GuildVoice,
    /// A direct message between multiple users
    GroupDm,
    /// A category that contains channels
    GuildCategory,
    /// An announcement channel
    GuildAnnouncement,
    /// Threads of any kind
    Thread,
    Other(u8),
}

impl From<u8> for ChannelType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10..=12 => Self::Thread,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        match kind {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildVoice => 2,
            ChannelType::GroupDm => 3,
            ChannelType::GuildCategory => 4,
            ChannelType::GuildAnnouncement => 5,
            ChannelType::Thread => 11,
            ChannelType::Other(code) => code,
        }
    }
}

/// Cached channel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CachedChannel {
    #[serde(with = "snowflake_str")]
    pub id: i64,

    #[serde(default, with = "snowflake_str_opt")]
    pub guild_id: Option<i64>,

    #[serde(rename = "type")]
    pub channel_type: ChannelType,

    /// Bot's effective permissions in this channel
    #[serde(default)]
    pub bot_permissions: Permissions,
}

impl CachedChannel {
    /// Standard guild text channel.
    pub fn is_guild_text(&self) -> bool {
        self.channel_type == ChannelType::GuildText && self.guild_id.is_some()
    }
}

/// Read access to the channel cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelCache: Send + Sync {
    async fn get_channel(&self, channel_id: i64) -> Result<Option<CachedChannel>, AppError>;
}
