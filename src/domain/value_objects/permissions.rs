//! Discord-compatible permission flags.
//!
//! Only the flags the proxy pipeline inspects are named here; the bitfield
//! itself carries whatever the platform reported for the channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 64-bit permission bitfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    /// Allows all permissions and bypasses channel permission overwrites
    pub const ADMINISTRATOR: u64 = 1 << 3;
    /// Allows for sending messages in a channel
    pub const SEND_MESSAGES: u64 = 1 << 11;
    /// Allows for deletion of other users messages
    pub const MANAGE_MESSAGES: u64 = 1 << 13;
    /// Allows management and editing of webhooks
    pub const MANAGE_WEBHOOKS: u64 = 1 << 29;

    /// Everything the proxy pipeline needs in a channel.
    pub const PROXY_REQUIRED: u64 =
        Self::SEND_MESSAGES | Self::MANAGE_WEBHOOKS | Self::MANAGE_MESSAGES;

    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Check if every flag in `permission` is set.
    pub const fn has(&self, permission: u64) -> bool {
        if self.is_admin() {
            return true;
        }
        self.0 & permission == permission
    }

    /// Administrator overrides every other flag.
    pub const fn is_admin(&self) -> bool {
        self.0 & Self::ADMINISTRATOR != 0
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Permissions {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
