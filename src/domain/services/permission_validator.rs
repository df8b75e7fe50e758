//! Bot permission checks for the channel a message was sent in.

use crate::domain::value_objects::Permissions;

/// A missing permission, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PermissionDenial {
    /// Nothing can be posted in the channel, not even an explanation
    #[error("missing Send Messages")]
    SendMessages,
    #[error("missing Manage Webhooks")]
    ManageWebhooks,
    #[error("missing Manage Messages")]
    ManageMessages,
}

impl PermissionDenial {
    /// Text posted into the channel, `None` when the denial is silent.
    pub fn diagnostic(&self, error_emoji: &str) -> Option<String> {
        match self {
            Self::SendMessages => None,
            Self::ManageWebhooks => Some(format!(
                "{} I do not have the *Manage Webhooks* permission in this channel, and thus cannot proxy messages. Please contact a server administrator to remedy this.",
                error_emoji
            )),
            Self::ManageMessages => Some(format!(
                "{} I do not have the *Manage Messages* permission in this channel, and thus cannot delete the original trigger message. Please contact a server administrator to remedy this.",
                error_emoji
            )),
        }
    }
}

/// Checks the bot's permissions in a channel before proxying.
pub struct PermissionValidator;

impl PermissionValidator {
    /// First missing permission wins.
    ///
    /// Manage Messages does not stand in for a missing Send Messages.
    pub fn validate(permissions: Permissions) -> Result<(), PermissionDenial> {
        if !permissions.has(Permissions::SEND_MESSAGES) {
            return Err(PermissionDenial::SendMessages);
        }
        if !permissions.has(Permissions::MANAGE_WEBHOOKS) {
            return Err(PermissionDenial::ManageWebhooks);
        }
        if !permissions.has(Permissions::MANAGE_MESSAGES) {
            return Err(PermissionDenial::ManageMessages);
        }
        Ok(())
    }
}
