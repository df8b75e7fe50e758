//! Log Channel
//!
//! Posts an embed describing each proxied message to the guild's configured
//! log channel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::platform::{
    AuditLogger, ChannelClient, CreateMessage, Embed, EmbedField, EmbedFooter, EmbedImage,
};
use crate::domain::services::ProxyMatch;
use crate::domain::{MessageContext, Snowflake, TriggerMessage};
use crate::shared::error::AppError;

/// Embed descriptions are capped by the platform.
const MAX_DESCRIPTION_LENGTH: usize = 4096;

/// [`AuditLogger`] writing to the guild log channel.
pub struct LogChannelService {
    channels: Arc<dyn ChannelClient>,
}

impl LogChannelService {
    pub fn new(channels: Arc<dyn ChannelClient>) -> Self {
        Self { channels }
    }

    /// Log target for this message, if any.
    fn target(ctx: &MessageContext) -> Option<i64> {
        if ctx.in_log_blacklist {
            return None;
        }
        ctx.log_channel
    }

    pub fn build_embed(
        ctx: &MessageContext,
        proxy: &ProxyMatch,
        trigger: &TriggerMessage,
        proxy_message_id: i64,
    ) -> Embed {
        let member = &proxy.member;
        let description: String = if proxy.content.is_empty() {
            "*(message contains no text)*".to_string()
        } else {
            proxy.content.chars().take(MAX_DESCRIPTION_LENGTH).collect()
        };
        let jump_link = format!(
            "https://discord.com/channels/{}/{}/{}",
            trigger.guild_id.unwrap_or_default(),
            trigger.channel_id,
            proxy_message_id
        );
        let system = ctx
            .system_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        Embed {
            title: Some(format!("Message proxied as {}", member.proxy_name(ctx))),
            description: Some(description),
            fields: vec![
                EmbedField {
                    name: "Channel".into(),
                    value: format!("<#{}>", trigger.channel_id),
                    inline: true,
                },
                EmbedField {
                    name: "Link".into(),
                    value: format!("[Jump to message]({})", jump_link),
                    inline: true,
                },
            ],
            footer: Some(EmbedFooter {
                text: format!(
                    "System ID: {} | Member ID: {} | Sender: {} ({}) | Message ID: {} | Original Message ID: {}",
                    system, member.hid, trigger.author.username, trigger.author.id, proxy_message_id, trigger.id
                ),
            }),
            timestamp: Some(Snowflake::new(proxy_message_id).created_at().to_rfc3339()),
            thumbnail: member.proxy_avatar(ctx).map(|url| EmbedImage { url }),
        }
    }
}

#[async_trait]
impl AuditLogger for LogChannelService {
    #[instrument(skip_all, fields(proxy_message_id = proxy_message_id), level = "debug")]
    async fn log_message(
        &self,
        ctx: &MessageContext,
        proxy: &ProxyMatch,
        trigger: &TriggerMessage,
        proxy_message_id: i64,
    ) -> Result<(), AppError> {
        let Some(log_channel) = Self::target(ctx) else {
            debug!("No log channel for this message");
            return Ok(());
        };

        let embed = Self::build_embed(ctx, proxy, trigger, proxy_message_id);
        self.channels
            .send_message(log_channel, CreateMessage::embed(embed))
            .await?;
        Ok(())
    }
}
