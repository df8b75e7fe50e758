//! # Platform Ports
//!
//! Outbound operations against the chat platform. Implemented over REST in
//! the infrastructure layer; mocked in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::{Attachment, MessageContext, TriggerMessage};
use crate::domain::services::ProxyMatch;
use crate::shared::error::{AppError, RestError};

/// A message sent through the channel's proxy webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub channel_id: i64,
    /// Username shown on the message
    pub name: String,
    pub avatar_url: Option<String>,
    pub content: String,
    /// Files to re-upload with the message
    pub attachments: Vec<Attachment>,
}

/// Embed body for bot-authored messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

/// A bot-authored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl CreateMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

/// Performs the outbound proxy send.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Send the replacement message, returning its ID.
    async fn execute(&self, request: WebhookRequest) -> Result<i64, RestError>;
}

/// Bot-authored channel operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Post a message as the bot, returning its ID.
    async fn send_message(&self, channel_id: i64, message: CreateMessage) -> Result<i64, RestError>;

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), RestError>;
}

/// Writes a record of each proxy event to the guild's log channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log_message(
        &self,
        ctx: &MessageContext,
        proxy: &ProxyMatch,
        trigger: &TriggerMessage,
        proxy_message_id: i64,
    ) -> Result<(), AppError>;
}
