//! Proxy Service
//!
//! Runs one inbound message through the proxy pipeline:
//!
//! ```text
//! Received -> Eligible -> Matched -> PermissionOk -> NameOk -> Sent
//!          -> Recorded -> Logged -> DeleteScheduled -> Deleted
//! ```
//!
//! Every guard before `Sent` aborts without side effects (apart from a single
//! diagnostic for user-facing denials). `Sent` is the point of no return: the
//! replacement message exists, so the remaining steps always run to the end
//! and failures are only logged.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::config::{EmojiSettings, ProxySettings};
use crate::domain::platform::{AuditLogger, ChannelClient, CreateMessage, WebhookRequest, WebhookSender};
use crate::domain::services::{
    EligibilityGate, Ineligible, NameBoundsValidator, NameError, PermissionDenial,
    PermissionValidator, ProxyMatch, ProxyMatcher,
};
use crate::domain::{
    CachedChannel, MemberRepository, MessageContext, ProxiedMessage, ProxiedMessageRepository,
    TriggerMessage,
};

/// Why the pipeline stopped before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Ineligible(Ineligible),
    /// The candidate members could not be loaded
    LookupFailed,
    NoMatch,
    PermissionDenied(PermissionDenial),
    InvalidName(NameError),
    /// The webhook send failed; the trigger message is left in place
    SendFailed,
}

impl AbortReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ineligible(_) => "ineligible",
            Self::LookupFailed => "lookup_failed",
            Self::NoMatch => "no_match",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InvalidName(_) => "invalid_name",
            Self::SendFailed => "send_failed",
        }
    }
}

/// Pipeline state for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyStage {
    Received,
    Eligible,
    Matched,
    PermissionOk,
    NameOk,
    Sent,
    Recorded,
    Logged,
    DeleteScheduled,
    Deleted,
    Aborted(AbortReason),
}

impl ProxyStage {
    /// Whether a replacement message was sent.
    pub fn is_proxied(&self) -> bool {
        matches!(
            self,
            Self::Sent | Self::Recorded | Self::Logged | Self::DeleteScheduled | Self::Deleted
        )
    }

    /// Metric label of a terminal stage.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Eligible => "eligible",
            Self::Matched => "matched",
            Self::PermissionOk => "permission_ok",
            Self::NameOk => "name_ok",
            Self::Sent => "sent",
            Self::Recorded => "recorded",
            Self::Logged => "logged",
            Self::DeleteScheduled => "delete_scheduled",
            Self::Deleted => "deleted",
            Self::Aborted(reason) => reason.label(),
        }
    }
}

/// Ports the pipeline talks to.
#[derive(Clone)]
pub struct ProxyPorts {
    pub members: Arc<dyn MemberRepository>,
    pub messages: Arc<dyn ProxiedMessageRepository>,
    pub webhooks: Arc<dyn WebhookSender>,
    pub channels: Arc<dyn ChannelClient>,
    pub audit: Arc<dyn AuditLogger>,
}

/// Proxy pipeline executor.
#[derive(Clone)]
pub struct ProxyService {
    ports: ProxyPorts,
    matcher: ProxyMatcher,
    names: NameBoundsValidator,
    settings: Arc<ProxySettings>,
    emojis: Arc<EmojiSettings>,
    /// Post-send tasks, shared by every clone
    completions: TaskTracker,
}

impl ProxyService {
    pub fn new(ports: ProxyPorts, settings: ProxySettings, emojis: EmojiSettings) -> Self {
        Self {
            ports,
            matcher: ProxyMatcher::new(settings.latch_timeout()),
            names: NameBoundsValidator::new(settings.min_name_length, settings.max_name_length),
            settings: Arc::new(settings),
            emojis: Arc::new(emojis),
            completions: TaskTracker::new(),
        }
    }

    /// Wait for every sent proxy to finish its cleanup.
    ///
    /// Called on shutdown once no more messages arrive. Proxies sent after
    /// this call are still awaited.
    pub async fn wait_for_completions(&self) {
        self.completions.close();
        self.completions.wait().await;
    }

    /// Sent proxies whose cleanup is still running.
    pub fn pending_completions(&self) -> usize {
        self.completions.len()
    }

    /// Try to proxy `trigger`, returning whether a proxy occurred.
    ///
    /// `allow_autoproxy` is false for edits, which only proxy on a tag.
    pub async fn handle_incoming_message(
        &self,
        trigger: TriggerMessage,
        channel: &CachedChannel,
        ctx: &MessageContext,
        allow_autoproxy: bool,
    ) -> bool {
        self.run(trigger, channel, ctx, allow_autoproxy)
            .await
            .is_proxied()
    }

    /// Drive the pipeline to a terminal stage.
    pub async fn run(
        &self,
        trigger: TriggerMessage,
        channel: &CachedChannel,
        ctx: &MessageContext,
        allow_autoproxy: bool,
    ) -> ProxyStage {
        // Received -> Eligible
        if let Err(reason) = EligibilityGate::check(&trigger, channel, ctx) {
            trace!(message_id = trigger.id, %reason, "Message not eligible for proxying");
            return ProxyStage::Aborted(AbortReason::Ineligible(reason));
        }
        let Some(guild_id) = channel.guild_id.or(trigger.guild_id) else {
            return ProxyStage::Aborted(AbortReason::Ineligible(Ineligible::NotGuildText));
        };

        // Eligible -> Matched
        let members = match self
            .ports
            .members
            .find_proxy_members(trigger.author.id, guild_id)
            .await
        {
            Ok(members) => members,
            Err(e) => {
                error!(message_id = trigger.id, error = %e, "Failed to load proxy members");
                return ProxyStage::Aborted(AbortReason::LookupFailed);
            }
        };
        let Some(proxy) = self.matcher.try_match(
            ctx,
            &members,
            &trigger.content,
            trigger.has_attachments(),
            allow_autoproxy,
            Utc::now(),
        ) else {
            trace!(message_id = trigger.id, "No proxy match");
            return ProxyStage::Aborted(AbortReason::NoMatch);
        };

        // Matched -> PermissionOk
        if let Err(denial) = PermissionValidator::validate(channel.bot_permissions) {
            info!(message_id = trigger.id, channel_id = channel.id, %denial, "Missing channel permission");
            if let Some(text) = denial.diagnostic(&self.emojis.error) {
                self.send_diagnostic(trigger.channel_id, text).await;
            }
            return ProxyStage::Aborted(AbortReason::PermissionDenied(denial));
        }

        // PermissionOk -> NameOk
        let name = proxy.member.proxy_name(ctx);
        if let Err(err) = self.names.validate(&name) {
            info!(message_id = trigger.id, member_id = proxy.member.id, %err, "Proxy name out of bounds");
            self.send_diagnostic(trigger.channel_id, err.user_message(&self.emojis.error))
                .await;
            return ProxyStage::Aborted(AbortReason::InvalidName(err));
        }

        // NameOk -> Sent
        let request = WebhookRequest {
            channel_id: trigger.channel_id,
            name,
            avatar_url: proxy.member.proxy_avatar(ctx),
            content: truncate_chars(&proxy.content, self.settings.max_content_length),
            attachments: trigger.attachments.clone(),
        };
        let proxy_message_id = match self.ports.webhooks.execute(request).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    message_id = trigger.id,
                    channel_id = trigger.channel_id,
                    error = %e,
                    "Failed to send proxy message, leaving trigger in place"
                );
                return ProxyStage::Aborted(AbortReason::SendFailed);
            }
        };
        debug!(
            trigger_id = trigger.id,
            proxy_message_id,
            member_id = proxy.member.id,
            "Proxy message sent"
        );

        // The rest must finish even if this future is dropped.
        let this = self.clone();
        let ctx = ctx.clone();
        let handle = self.completions.spawn(async move {
            this.complete(ctx, proxy, trigger, proxy_message_id).await
        });
        match handle.await {
            Ok(stage) => stage,
            Err(e) => {
                error!(proxy_message_id, error = %e, "Post-send task failed");
                ProxyStage::Sent
            }
        }
    }

    /// Sent -> Recorded -> Logged -> DeleteScheduled -> Deleted, best effort.
    async fn complete(
        self,
        ctx: MessageContext,
        proxy: ProxyMatch,
        trigger: TriggerMessage,
        proxy_message_id: i64,
    ) -> ProxyStage {
        let record = ProxiedMessage {
            author_id: trigger.author.id,
            guild_id: trigger.guild_id,
            channel_id: trigger.channel_id,
            proxy_message_id,
            trigger_message_id: trigger.id,
            member_id: proxy.member.id,
        };
        if let Err(e) = self.ports.messages.record(&record).await {
            error!(
                proxy_message_id,
                trigger_id = trigger.id,
                error = %e,
                "Failed to record proxied message"
            );
        }

        if let Err(e) = self
            .ports
            .audit
            .log_message(&ctx, &proxy, &trigger, proxy_message_id)
            .await
        {
            warn!(proxy_message_id, error = %e, "Failed to write log channel entry");
        }

        tokio::time::sleep(self.settings.deletion_delay()).await;

        match self
            .ports
            .channels
            .delete_message(trigger.channel_id, trigger.id)
            .await
        {
            Ok(()) => ProxyStage::Deleted,
            Err(e) if e.is_not_found() => {
                warn!(
                    trigger_id = trigger.id,
                    "Attempted to delete already deleted proxy trigger message"
                );
                ProxyStage::Deleted
            }
            Err(e) => {
                error!(trigger_id = trigger.id, error = %e, "Failed to delete trigger message");
                ProxyStage::DeleteScheduled
            }
        }
    }

    async fn send_diagnostic(&self, channel_id: i64, text: String) {
        if let Err(e) = self
            .ports
            .channels
            .send_message(channel_id, CreateMessage::text(text))
            .await
        {
            warn!(channel_id, error = %e, "Failed to send diagnostic message");
        }
    }
}

/// Cut `content` to at most `max` characters.
fn truncate_chars(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((index, _)) => content[..index].to_string(),
        None => content.to_string(),
    }
}
