//! Common Test Utilities
//!
//! Recording fakes of the service's ports, and fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use proxy_bot::application::services::{ProxyPorts, ProxyService};
use proxy_bot::config::{EmojiSettings, ProxySettings};
use proxy_bot::domain::platform::{
    AuditLogger, ChannelClient, CreateMessage, WebhookRequest, WebhookSender,
};
use proxy_bot::domain::services::ProxyMatch;
use proxy_bot::domain::{
    CachedChannel, ChannelCache, ChannelType, MemberRepository, MessageAuthor, MessageContext,
    MessageContextRepository, Permissions, ProxiedMessage, ProxiedMessageRepository, ProxyMember,
    ProxyTag, TriggerMessage,
};
use proxy_bot::shared::error::{AppError, RestError};

pub const AUTHOR: i64 = 1;
pub const CHANNEL: i64 = 10;
pub const GUILD: i64 = 20;
pub const SYSTEM: i64 = 7;
pub const ALICE: i64 = 501;
pub const BOB: i64 = 502;

// =============================================================================
// Fixtures
// =============================================================================

pub fn tag(prefix: &str, suffix: &str) -> ProxyTag {
    ProxyTag::new(Some(prefix.to_string()), Some(suffix.to_string())).expect("valid tag")
}

pub fn member(id: i64, name: &str, tags: Vec<ProxyTag>) -> ProxyMember {
    ProxyMember {
        id,
        hid: format!("m{}", id),
        name: name.to_string(),
        proxy_tags: tags,
        allow_autoproxy: true,
        ..Default::default()
    }
}

pub fn alice() -> ProxyMember {
    member(ALICE, "Alice", vec![tag("A:", "")])
}

pub fn trigger(id: i64, content: &str) -> TriggerMessage {
    TriggerMessage {
        id,
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        author: MessageAuthor {
            id: AUTHOR,
            username: "author".into(),
            ..Default::default()
        },
        content: content.to_string(),
        ..Default::default()
    }
}

pub fn text_channel(bits: u64) -> CachedChannel {
    CachedChannel {
        id: CHANNEL,
        guild_id: Some(GUILD),
        channel_type: ChannelType::GuildText,
        bot_permissions: Permissions::new(bits),
    }
}

pub fn context() -> MessageContext {
    MessageContext {
        system_id: Some(SYSTEM),
        proxy_enabled: true,
        ..Default::default()
    }
}

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
pub struct FakeMembers {
    pub members: Vec<ProxyMember>,
}

#[async_trait]
impl MemberRepository for FakeMembers {
    async fn find_proxy_members(&self, _account_id: i64, _guild_id: i64) -> Result<Vec<ProxyMember>, AppError> {
        Ok(self.members.clone())
    }
}

#[derive(Default)]
pub struct FakeMessageStore {
    pub records: Mutex<Vec<ProxiedMessage>>,
    pub fail: bool,
}

#[async_trait]
impl ProxiedMessageRepository for FakeMessageStore {
    async fn record(&self, message: &ProxiedMessage) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal("store unavailable".into()));
        }
        self.records.lock().unwrap().push(*message);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWebhooks {
    pub requests: Mutex<Vec<WebhookRequest>>,
    pub fail: bool,
}

#[async_trait]
impl WebhookSender for FakeWebhooks {
    async fn execute(&self, request: WebhookRequest) -> Result<i64, RestError> {
        if self.fail {
            return Err(RestError::Status {
                code: 502,
                body: "bad gateway".into(),
            });
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        Ok(9000 + requests.len() as i64)
    }
}

/// How the fake answers deletions.
#[derive(Default, Clone, Copy)]
pub enum DeleteBehaviour {
    #[default]
    Succeed,
    AlreadyGone,
    Forbidden,
}

#[derive(Default)]
pub struct FakeChannels {
    pub sent: Mutex<Vec<(i64, CreateMessage)>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    pub delete_behaviour: DeleteBehaviour,
}

#[async_trait]
impl ChannelClient for FakeChannels {
    async fn send_message(&self, channel_id: i64, message: CreateMessage) -> Result<i64, RestError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((channel_id, message));
        Ok(5000 + sent.len() as i64)
    }

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), RestError> {
        self.deleted.lock().unwrap().push((channel_id, message_id));
        match self.delete_behaviour {
            DeleteBehaviour::Succeed => Ok(()),
            DeleteBehaviour::AlreadyGone => Err(RestError::NotFound("Unknown Message".into())),
            DeleteBehaviour::Forbidden => Err(RestError::Forbidden("Missing Permissions".into())),
        }
    }
}

#[derive(Default)]
pub struct FakeAudit {
    pub logged: Mutex<Vec<(i64, i64)>>,
    pub fail: bool,
}

#[async_trait]
impl AuditLogger for FakeAudit {
    async fn log_message(
        &self,
        _ctx: &MessageContext,
        proxy: &ProxyMatch,
        _trigger: &TriggerMessage,
        proxy_message_id: i64,
    ) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Internal("log channel unavailable".into()));
        }
        self.logged.lock().unwrap().push((proxy.member.id, proxy_message_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeChannelCache {
    pub channels: HashMap<i64, CachedChannel>,
}

#[async_trait]
impl ChannelCache for FakeChannelCache {
    async fn get_channel(&self, channel_id: i64) -> Result<Option<CachedChannel>, AppError> {
        Ok(self.channels.get(&channel_id).copied())
    }
}

pub struct FakeContexts {
    pub context: MessageContext,
}

#[async_trait]
impl MessageContextRepository for FakeContexts {
    async fn load_context(&self, _account_id: i64, _guild_id: i64, _channel_id: i64) -> Result<MessageContext, AppError> {
        Ok(self.context.clone())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Fakes wired into a [`ProxyService`], kept around for inspection.
pub struct Harness {
    pub members: Arc<FakeMembers>,
    pub store: Arc<FakeMessageStore>,
    pub webhooks: Arc<FakeWebhooks>,
    pub channels: Arc<FakeChannels>,
    pub audit: Arc<FakeAudit>,
}

impl Harness {
    pub fn new(members: Vec<ProxyMember>) -> Self {
        Self {
            members: Arc::new(FakeMembers { members }),
            store: Arc::new(FakeMessageStore::default()),
            webhooks: Arc::new(FakeWebhooks::default()),
            channels: Arc::new(FakeChannels::default()),
            audit: Arc::new(FakeAudit::default()),
        }
    }

    pub fn with_store(mut self, store: FakeMessageStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_webhooks(mut self, webhooks: FakeWebhooks) -> Self {
        self.webhooks = Arc::new(webhooks);
        self
    }

    pub fn with_channels(mut self, channels: FakeChannels) -> Self {
        self.channels = Arc::new(channels);
        self
    }

    pub fn with_audit(mut self, audit: FakeAudit) -> Self {
        self.audit = Arc::new(audit);
        self
    }

    pub fn service(&self) -> ProxyService {
        let ports = ProxyPorts {
            members: self.members.clone(),
            messages: self.store.clone(),
            webhooks: self.webhooks.clone(),
            channels: self.channels.clone(),
            audit: self.audit.clone(),
        };
        ProxyService::new(ports, ProxySettings::default(), EmojiSettings::default())
    }

    pub fn webhook_requests(&self) -> Vec<WebhookRequest> {
        self.webhooks.requests.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<ProxiedMessage> {
        self.store.records.lock().unwrap().clone()
    }

    pub fn sent_messages(&self) -> Vec<(i64, CreateMessage)> {
        self.channels.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(i64, i64)> {
        self.channels.deleted.lock().unwrap().clone()
    }

    pub fn logged(&self) -> Vec<(i64, i64)> {
        self.audit.logged.lock().unwrap().clone()
    }
}
