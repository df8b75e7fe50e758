//! Trigger message, proxied message linkage and repository trait.
//!
//! The linkage maps to the `messages` table:
//! - mid: BIGINT PRIMARY KEY (proxy message ID)
//! - original_mid: BIGINT NOT NULL (trigger message ID)
//! - sender: BIGINT NOT NULL (trigger author account ID)
//! - guild: BIGINT NULL
//! - channel: BIGINT NOT NULL
//! - member: BIGINT NOT NULL REFERENCES members(id)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{snowflake_str, snowflake_str_opt};
use crate::shared::error::AppError;

/// Platform message types.
///
/// Only the numeric codes the pipeline distinguishes get a named variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum MessageType {
    /// A regular user message
    #[default]
    Default,
    /// A message was pinned
    ChannelPinnedMessage,
    /// A new member joined the server
    GuildMemberJoin,
    /// A reply to another message
    Reply,
    /// Any other system message
    Other(u8),
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Default,
            6 => Self::ChannelPinnedMessage,
            7 => Self::GuildMemberJoin,
            19 => Self::Reply,
            other => Self::Other(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Default => 0,
            MessageType::ChannelPinnedMessage => 6,
            MessageType::GuildMemberJoin => 7,
            MessageType::Reply => 19,
            MessageType::Other(code) => code,
        }
    }
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(with = "snowflake_str")]
    pub id: i64,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageAuthor {
    #[serde(with = "snowflake_str")]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub system: bool,
}

/// An inbound message that may trigger a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TriggerMessage {
    #[serde(with = "snowflake_str")]
    pub id: i64,

    #[serde(with = "snowflake_str")]
    pub channel_id: i64,

    #[serde(default, with = "snowflake_str_opt")]
    pub guild_id: Option<i64>,

    pub author: MessageAuthor,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    #[serde(rename = "type", default)]
    pub message_type: MessageType,

    /// Set when a webhook sent the message
    #[serde(default, with = "snowflake_str_opt")]
    pub webhook_id: Option<i64>,
}

impl TriggerMessage {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Content is missing or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn is_webhook(&self) -> bool {
        self.webhook_id.is_some()
    }

    /// Bots, platform system users and webhooks never trigger a proxy.
    pub fn is_automated(&self) -> bool {
        self.author.bot || self.author.system || self.is_webhook()
    }
}

/// Link between a trigger message and the proxy message that replaced it.
///
/// Written once after a successful send and never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxiedMessage {
    /// Account that sent the trigger message
    pub author_id: i64,
    pub guild_id: Option<i64>,
    pub channel_id: i64,
    /// The replacement message
    pub proxy_message_id: i64,
    /// The original trigger message
    pub trigger_message_id: i64,
    pub member_id: i64,
}

/// Repository trait for the proxied message linkage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProxiedMessageRepository: Send + Sync {
    /// Persist a linkage. Append-only.
    async fn record(&self, message: &ProxiedMessage) -> Result<(), AppError>;
}
