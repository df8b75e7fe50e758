//! Webhook Executor
//!
//! Sends proxy messages through one bot-owned webhook per channel. Webhooks
//! are looked up (or created) on first use and cached; a webhook that turns
//! out to be deleted is dropped from the cache and replaced once.

use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument, warn};

use super::{Webhook, WebhookApi, WebhookFile, WebhookMessage};
use crate::domain::platform::{WebhookRequest, WebhookSender};
use crate::domain::Attachment;
use crate::infrastructure::metrics;
use crate::shared::error::RestError;

/// [`WebhookSender`] backed by cached per-channel webhooks.
pub struct WebhookExecutor<A: WebhookApi> {
    api: A,
    webhook_name: String,
    cache: DashMap<i64, Webhook>,
}

impl<A: WebhookApi> WebhookExecutor<A> {
    pub fn new(api: A, webhook_name: impl Into<String>) -> Self {
        Self {
            api,
            webhook_name: webhook_name.into(),
            cache: DashMap::new(),
        }
    }

    /// Cached webhook for `channel_id`, fetching or creating it on a miss.
    async fn get_webhook(&self, channel_id: i64) -> Result<Webhook, RestError> {
        if let Some(hook) = self.cache.get(&channel_id) {
            return Ok(hook.clone());
        }

        let existing = self
            .api
            .list_channel_webhooks(channel_id)
            .await?
            .into_iter()
            .find(|hook| {
                hook.token.is_some() && hook.name.as_deref() == Some(self.webhook_name.as_str())
            });

        let hook = match existing {
            Some(hook) => hook,
            None => self.api.create_webhook(channel_id, &self.webhook_name).await?,
        };
        // No lock is held across the awaits above; a concurrent miss may
        // insert first, which is harmless since both hooks are usable.
        self.cache.insert(channel_id, hook.clone());
        Ok(hook)
    }

    fn invalidate(&self, channel_id: i64) {
        self.cache.remove(&channel_id);
    }

    async fn download_files(&self, attachments: &[Attachment]) -> Result<Vec<WebhookFile>, RestError> {
        let mut files = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let data = self.api.download(&attachment.url).await?;
            files.push(WebhookFile {
                filename: attachment.filename.clone(),
                data,
            });
        }
        Ok(files)
    }

    async fn send(&self, request: &WebhookRequest) -> Result<i64, RestError> {
        let files = self.download_files(&request.attachments).await?;
        let message = WebhookMessage::new(request, &files);

        let hook = self.get_webhook(request.channel_id).await?;
        match self.api.execute_webhook(&hook, &message, files.clone()).await {
            Err(e) if e.is_not_found() => {
                warn!(
                    channel_id = request.channel_id,
                    webhook_id = hook.id,
                    "Cached webhook is gone, recreating"
                );
                self.invalidate(request.channel_id);
                let hook = self.get_webhook(request.channel_id).await?;
                self.api.execute_webhook(&hook, &message, files).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<A: WebhookApi> WebhookSender for WebhookExecutor<A> {
    #[instrument(skip(self, request), fields(channel_id = request.channel_id), level = "debug")]
    async fn execute(&self, request: WebhookRequest) -> Result<i64, RestError> {
        let start = Instant::now();
        let result = self.send(&request).await;
        metrics::record_webhook_execute(result.is_ok(), start.elapsed().as_secs_f64());

        if let Ok(message_id) = &result {
            debug!(message_id, "Webhook executed");
        }
        result
    }
}
