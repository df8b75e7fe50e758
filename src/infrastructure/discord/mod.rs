//! Chat Platform Clients
//!
//! REST access to the chat platform:
//! - `DiscordRestClient`: bot-authenticated REST calls and webhook execution
//! - `WebhookExecutor`: per-channel proxy webhooks with a local cache
//!
//! Wire types mirror the platform's JSON; IDs travel as strings.

mod rest_client;
mod webhook_executor;

pub use rest_client::DiscordRestClient;
pub use webhook_executor::WebhookExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::platform::WebhookRequest;
use crate::domain::value_objects::{snowflake_str, snowflake_str_opt};
use crate::shared::error::RestError;

/// A channel webhook as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(with = "snowflake_str")]
    pub id: i64,
    #[serde(default, with = "snowflake_str_opt")]
    pub channel_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Only present on incoming webhooks the bot can execute
    #[serde(default)]
    pub token: Option<String>,
}

/// Reference to an uploaded file inside `payload_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub id: usize,
    pub filename: String,
}

/// Body of a webhook execute call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub content: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
    pub allowed_mentions: AllowedMentions,
}

/// Mentions the proxied message may ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<&'static str>,
}

impl Default for AllowedMentions {
    /// Users and roles, never `@everyone`.
    fn default() -> Self {
        Self {
            parse: vec!["users", "roles"],
        }
    }
}

impl WebhookMessage {
    pub fn new(request: &WebhookRequest, files: &[WebhookFile]) -> Self {
        Self {
            content: request.content.clone(),
            username: request.name.clone(),
            avatar_url: request.avatar_url.clone(),
            attachments: files
                .iter()
                .enumerate()
                .map(|(id, file)| AttachmentRef {
                    id,
                    filename: file.filename.clone(),
                })
                .collect(),
            allowed_mentions: AllowedMentions::default(),
        }
    }
}

/// A downloaded attachment ready for re-upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Webhook REST operations the executor needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookApi: Send + Sync {
    async fn list_channel_webhooks(&self, channel_id: i64) -> Result<Vec<Webhook>, RestError>;

    async fn create_webhook(&self, channel_id: i64, name: &str) -> Result<Webhook, RestError>;

    /// Execute with `wait=true`, returning the created message ID.
    async fn execute_webhook(
        &self,
        webhook: &Webhook,
        message: &WebhookMessage,
        files: Vec<WebhookFile>,
    ) -> Result<i64, RestError>;

    /// Fetch an attachment's bytes from the CDN.
    async fn download(&self, url: &str) -> Result<Vec<u8>, RestError>;
}
