//! Event Dispatcher
//!
//! Decodes gateway payloads and runs each message through the proxy
//! pipeline as an independent task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use super::events::{GatewayEvent, MessageUpdate};
use crate::application::services::{ProxyService, ProxyStage};
use crate::domain::{ChannelCache, MessageContextRepository, TriggerMessage};
use crate::infrastructure::metrics;

/// Routes gateway events to the proxy pipeline.
pub struct EventDispatcher {
    proxy: ProxyService,
    channels: Arc<dyn ChannelCache>,
    contexts: Arc<dyn MessageContextRepository>,
    /// Most recent message seen per channel, for edit-to-proxy. Dropped once
    /// that message is proxied away.
    last_messages: DashMap<i64, i64>,
}

impl EventDispatcher {
    pub fn new(
        proxy: ProxyService,
        channels: Arc<dyn ChannelCache>,
        contexts: Arc<dyn MessageContextRepository>,
    ) -> Self {
        Self {
            proxy,
            channels,
            contexts,
            last_messages: DashMap::new(),
        }
    }

    /// Decode a raw payload, logging anything unusable.
    pub fn decode(payload: &str) -> Option<GatewayEvent> {
        match GatewayEvent::decode(payload) {
            Ok(Some(GatewayEvent::Unknown(name))) => {
                metrics::record_gateway_event("unknown");
                debug!(event = %name, "Ignoring unhandled gateway event");
                None
            }
            Ok(Some(event)) => {
                metrics::record_gateway_event(event.name());
                Some(event)
            }
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Failed to decode gateway event");
                None
            }
        }
    }

    /// Consume payloads until `events` closes, then drain in-flight work.
    ///
    /// Tasks still running after `drain_timeout` are dropped; proxies that
    /// already sent finish on their own task.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<String>, drain_timeout: Duration) {
        let mut tasks = JoinSet::new();

        while let Some(payload) = events.recv().await {
            while let Some(result) = tasks.try_join_next() {
                Self::log_join_error(result);
            }

            let Some(event) = Self::decode(&payload) else {
                continue;
            };
            let this = Arc::clone(&self);
            tasks.spawn(async move {
                this.handle_event(event).await;
            });
        }

        info!(
            in_flight = tasks.len(),
            tracked_channels = self.tracked_channels(),
            "Event source closed, draining"
        );
        let drained = tokio::time::timeout(drain_timeout, async {
            while let Some(result) = tasks.join_next().await {
                Self::log_join_error(result);
            }
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "Drain timed out, cancelling remaining tasks");
            tasks.shutdown().await;
        }
    }

    fn log_join_error(result: Result<(), tokio::task::JoinError>) {
        if let Err(e) = result {
            error!(error = %e, "Event task failed");
        }
    }

    /// Handle one decoded event; returns the stage the pipeline ended in, if
    /// it ran.
    pub async fn handle_event(&self, event: GatewayEvent) -> Option<ProxyStage> {
        let (channel_id, message_id, stage) = match event {
            GatewayEvent::MessageCreate(message) => {
                let (channel_id, message_id) = (message.channel_id, message.id);
                self.last_messages.insert(channel_id, message_id);
                (channel_id, message_id, self.process(message, true).await)
            }
            GatewayEvent::MessageUpdate(update) => {
                let (channel_id, message_id) = (update.channel_id, update.id);
                (channel_id, message_id, self.handle_update(update).await)
            }
            GatewayEvent::Unknown(_) => return None,
        };

        if stage.as_ref().is_some_and(ProxyStage::is_proxied) {
            self.last_messages
                .remove_if(&channel_id, |_, latest| *latest == message_id);
        }
        stage
    }

    /// Channels whose latest message is still tracked for edits.
    pub fn tracked_channels(&self) -> usize {
        self.last_messages.len()
    }

    /// Only an edit of the channel's latest message is proxied, and only on
    /// a tag.
    async fn handle_update(&self, update: MessageUpdate) -> Option<ProxyStage> {
        let is_latest = self
            .last_messages
            .get(&update.channel_id)
            .is_some_and(|latest| *latest == update.id);
        if !is_latest {
            trace!(message_id = update.id, "Ignoring edit of an older message");
            return None;
        }

        let Some(message) = update.into_trigger() else {
            trace!("Ignoring partial message update");
            return None;
        };
        self.process(message, false).await
    }

    async fn process(&self, message: TriggerMessage, allow_autoproxy: bool) -> Option<ProxyStage> {
        // Skip the lookups for messages that can never proxy
        if message.is_automated() {
            return None;
        }
        let guild_id = message.guild_id?;

        let channel = match self.channels.get_channel(message.channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                debug!(channel_id = message.channel_id, "Channel not cached, skipping message");
                return None;
            }
            Err(e) => {
                error!(channel_id = message.channel_id, error = %e, "Failed to read channel cache");
                return None;
            }
        };

        let ctx = match self
            .contexts
            .load_context(message.author.id, guild_id, message.channel_id)
            .await
        {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(message_id = message.id, error = %e, "Failed to load message context");
                return None;
            }
        };

        let message_id = message.id;
        let stage = self.proxy.run(message, &channel, &ctx, allow_autoproxy).await;
        metrics::record_pipeline_outcome(stage.label());
        debug!(message_id, stage = stage.label(), "Pipeline finished");
        Some(stage)
    }
}
