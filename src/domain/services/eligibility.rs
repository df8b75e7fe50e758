//! Eligibility checks run before any candidate lookup.

use crate::domain::entities::{CachedChannel, MessageContext, MessageType, TriggerMessage};

/// Why a message is not considered for proxying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    #[error("author has no system")]
    NoSystem,
    #[error("channel is not a guild text channel")]
    NotGuildText,
    #[error("message is not a default message")]
    NonDefaultMessage,
    #[error("author is a bot, system user or webhook")]
    AutomatedAuthor,
    #[error("proxying is disabled in this guild")]
    ProxyDisabled,
    #[error("channel is blacklisted")]
    Blacklisted,
    #[error("message has no content or attachments")]
    Blank,
}

/// Decides whether a message is considered for proxying at all.
///
/// Failing any check is an expected, silent skip.
pub struct EligibilityGate;

impl EligibilityGate {
    /// Run every check in order, stopping at the first failure.
    pub fn check(
        message: &TriggerMessage,
        channel: &CachedChannel,
        ctx: &MessageContext,
    ) -> Result<(), Ineligible> {
        if ctx.system_id.is_none() {
            return Err(Ineligible::NoSystem);
        }
        if !channel.is_guild_text() {
            return Err(Ineligible::NotGuildText);
        }
        if message.message_type != MessageType::Default {
            return Err(Ineligible::NonDefaultMessage);
        }
        if message.is_automated() {
            return Err(Ineligible::AutomatedAuthor);
        }
        if !ctx.proxy_enabled {
            return Err(Ineligible::ProxyDisabled);
        }
        if ctx.in_blacklist {
            return Err(Ineligible::Blacklisted);
        }
        if message.is_blank() && !message.has_attachments() {
            return Err(Ineligible::Blank);
        }
        Ok(())
    }

    pub fn is_eligible(message: &TriggerMessage, channel: &CachedChannel, ctx: &MessageContext) -> bool {
        Self::check(message, channel, ctx).is_ok()
    }
}
