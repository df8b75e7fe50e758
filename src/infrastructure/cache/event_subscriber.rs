//! Gateway Event Subscriber
//!
//! Consumes dispatch packets the gateway process publishes on a Redis
//! pub/sub channel and forwards the raw payloads to the dispatcher.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::shared::error::AppError;

/// Delay before resubscribing after the connection drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Redis pub/sub event source.
pub struct RedisEventSubscriber {
    client: redis::Client,
    channel: String,
}

impl RedisEventSubscriber {
    pub fn new(url: &str, channel: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            channel: channel.into(),
        })
    }

    /// Forward payloads into `sink` until `shutdown` flips or the sink closes.
    ///
    /// Connection failures are retried after a fixed delay.
    pub async fn run(self, sink: mpsc::Sender<String>, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.consume(&sink, &mut shutdown).await {
                Ok(()) => break,
                Err(e) => {
                    error!(channel = %self.channel, error = %e, "Event subscription failed");
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => {
                    info!(channel = %self.channel, "Resubscribing to gateway events");
                }
            }
        }
        info!("Event subscriber stopped");
    }

    /// Returns `Ok` on shutdown or when the sink is gone, `Err` when Redis
    /// drops the subscription.
    async fn consume(
        &self,
        sink: &mpsc::Sender<String>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), AppError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.channel).await?;
        info!(channel = %self.channel, "Subscribed to gateway events");

        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                msg = messages.next() => {
                    let Some(msg) = msg else {
                        return Err(AppError::Internal("pub/sub stream closed".into()));
                    };
                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "Dropping non-text event payload");
                            continue;
                        }
                    };
                    if sink.send(payload).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
