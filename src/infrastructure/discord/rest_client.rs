//! Platform REST Client
//!
//! Bot-authenticated calls against the platform's v10 REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{Webhook, WebhookApi, WebhookFile, WebhookMessage};
use crate::config::DiscordSettings;
use crate::domain::platform::{ChannelClient, CreateMessage};
use crate::domain::value_objects::snowflake_str;
use crate::shared::error::RestError;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(with = "snowflake_str")]
    id: i64,
}

/// REST client for bot and webhook calls.
#[derive(Clone)]
pub struct DiscordRestClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl DiscordRestClient {
    pub fn new(settings: &DiscordSettings) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("proxy-bot/", env!("CARGO_PKG_VERSION"))),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base_url.trim_end_matches('/').to_string(),
            token: settings.token.trim().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("Bot {}", self.token))
    }

    /// Turn a non-success response into a [`RestError`].
    async fn check(response: Response) -> Result<Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(RestError::from_status(status.as_u16(), body, retry_after))
    }
}

#[async_trait]
impl ChannelClient for DiscordRestClient {
    #[instrument(skip(self, message), level = "debug")]
    async fn send_message(&self, channel_id: i64, message: CreateMessage) -> Result<i64, RestError> {
        let response = self
            .authorized(self.http.post(self.url(&format!("/channels/{}/messages", channel_id))))
            .json(&message)
            .send()
            .await?;
        let created: MessageResponse = Self::check(response).await?.json().await?;
        Ok(created.id)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), RestError> {
        let response = self
            .authorized(self.http.delete(self.url(&format!(
                "/channels/{}/messages/{}",
                channel_id, message_id
            ))))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl WebhookApi for DiscordRestClient {
    #[instrument(skip(self), level = "debug")]
    async fn list_channel_webhooks(&self, channel_id: i64) -> Result<Vec<Webhook>, RestError> {
        let response = self
            .authorized(self.http.get(self.url(&format!("/channels/{}/webhooks", channel_id))))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip(self), level = "debug")]
    async fn create_webhook(&self, channel_id: i64, name: &str) -> Result<Webhook, RestError> {
        let response = self
            .authorized(self.http.post(self.url(&format!("/channels/{}/webhooks", channel_id))))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let webhook: Webhook = Self::check(response).await?.json().await?;
        debug!(webhook_id = webhook.id, channel_id, "Created proxy webhook");
        Ok(webhook)
    }

    /// Webhook calls authenticate with the webhook token, not the bot token.
    #[instrument(skip(self, webhook, message, files), fields(webhook_id = webhook.id), level = "debug")]
    async fn execute_webhook(
        &self,
        webhook: &Webhook,
        message: &WebhookMessage,
        files: Vec<WebhookFile>,
    ) -> Result<i64, RestError> {
        let token = webhook
            .token
            .as_deref()
            .ok_or_else(|| RestError::NotFound(format!("webhook {} has no token", webhook.id)))?;
        let url = self.url(&format!("/webhooks/{}/{}?wait=true", webhook.id, token));

        let request = if files.is_empty() {
            self.http.post(url).json(message)
        } else {
            let mut form = Form::new().text("payload_json", serde_json::to_string(message)?);
            for (index, file) in files.into_iter().enumerate() {
                form = form.part(
                    format!("files[{}]", index),
                    Part::bytes(file.data).file_name(file.filename),
                );
            }
            self.http.post(url).multipart(form)
        };

        let created: MessageResponse = Self::check(request.send().await?).await?.json().await?;
        Ok(created.id)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, RestError> {
        let response = self.http.get(url).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
