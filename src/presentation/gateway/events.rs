//! Gateway Event Types
//!
//! Dispatch packets as published by the gateway process, and the closed set
//! of events the proxy service acts on.

use serde::Deserialize;

use crate::domain::value_objects::{snowflake_str, snowflake_str_opt};
use crate::domain::{Attachment, MessageAuthor, MessageType, TriggerMessage};

/// Gateway opcode of event dispatches; every other opcode is ignored.
pub const OP_DISPATCH: u8 = 0;

/// Raw gateway packet
#[derive(Debug, Deserialize)]
pub struct GatewayPacket {
    pub op: u8,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// Event kinds the service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    MessageCreate,
    MessageUpdate,
}

/// Dispatch names mapped to the payload shape they carry.
static EVENT_TYPES: &[(&str, EventKind)] = &[
    ("MESSAGE_CREATE", EventKind::MessageCreate),
    ("MESSAGE_UPDATE", EventKind::MessageUpdate),
];

impl EventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        EVENT_TYPES
            .iter()
            .find(|(event, _)| *event == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageUpdate => "MESSAGE_UPDATE",
        }
    }
}

/// Partial message carried by MESSAGE_UPDATE.
///
/// Only fields that changed are guaranteed to be present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageUpdate {
    #[serde(with = "snowflake_str")]
    pub id: i64,
    #[serde(with = "snowflake_str")]
    pub channel_id: i64,
    #[serde(default, with = "snowflake_str_opt")]
    pub guild_id: Option<i64>,
    #[serde(default)]
    pub author: Option<MessageAuthor>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(rename = "type", default)]
    pub message_type: Option<MessageType>,
    #[serde(default, with = "snowflake_str_opt")]
    pub webhook_id: Option<i64>,
}

impl MessageUpdate {
    /// Full message, when the update carries both author and content.
    pub fn into_trigger(self) -> Option<TriggerMessage> {
        Some(TriggerMessage {
            id: self.id,
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            author: self.author?,
            content: self.content?,
            attachments: self.attachments.unwrap_or_default(),
            message_type: self.message_type.unwrap_or_default(),
            webhook_id: self.webhook_id,
        })
    }
}

/// A decoded dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    MessageCreate(TriggerMessage),
    MessageUpdate(MessageUpdate),
    /// A dispatch this service does not handle
    Unknown(String),
}

/// Failure to decode a packet.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid gateway packet: {0}")]
    InvalidPacket(#[source] serde_json::Error),

    #[error("malformed {event} payload: {source}")]
    Malformed {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayEvent {
    /// Decode a raw packet. Non-dispatch packets yield `None`.
    pub fn decode(raw: &str) -> Result<Option<Self>, EventError> {
        let packet: GatewayPacket = serde_json::from_str(raw).map_err(EventError::InvalidPacket)?;
        Self::from_packet(packet)
    }

    pub fn from_packet(packet: GatewayPacket) -> Result<Option<Self>, EventError> {
        if packet.op != OP_DISPATCH {
            return Ok(None);
        }
        let Some(name) = packet.t else {
            return Ok(None);
        };
        let Some(kind) = EventKind::from_name(&name) else {
            return Ok(Some(Self::Unknown(name)));
        };

        let data = packet.d.unwrap_or(serde_json::Value::Null);
        let malformed = |source| EventError::Malformed {
            event: kind.name(),
            source,
        };
        let event = match kind {
            EventKind::MessageCreate => {
                Self::MessageCreate(serde_json::from_value(data).map_err(malformed)?)
            }
            EventKind::MessageUpdate => {
                Self::MessageUpdate(serde_json::from_value(data).map_err(malformed)?)
            }
        };
        Ok(Some(event))
    }

    /// Metric label.
    pub fn name(&self) -> &str {
        match self {
            Self::MessageCreate(_) => EventKind::MessageCreate.name(),
            Self::MessageUpdate(_) => EventKind::MessageUpdate.name(),
            Self::Unknown(name) => name,
        }
    }
}
