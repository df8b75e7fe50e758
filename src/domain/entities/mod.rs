//! # Domain Entities
//!
//! Snapshots the proxy pipeline reads and the linkage it writes.
//!
//! ## Entities
//!
//! - **ProxyMember / ProxyTag**: a system member and the tags that select it
//! - **MessageContext**: system and guild settings for one inbound message
//! - **TriggerMessage**: the inbound message that may be proxied
//! - **ProxiedMessage**: trigger-to-proxy linkage recorded after a send
//! - **CachedChannel**: channel type and bot permissions from the cache
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod channel;
mod context;
mod member;
mod message;

pub use channel::{CachedChannel, ChannelCache, ChannelType};
pub use context::{AutoproxyMode, LastMessage, MessageContext, MessageContextRepository};
pub use member::{MemberRepository, ProxyMember, ProxyTag};
pub use message::{
    Attachment, MessageAuthor, MessageType, ProxiedMessage, ProxiedMessageRepository,
    TriggerMessage,
};

#[cfg(test)]
pub use channel::MockChannelCache;
#[cfg(test)]
pub use context::MockMessageContextRepository;
#[cfg(test)]
pub use member::MockMemberRepository;
#[cfg(test)]
pub use message::MockProxiedMessageRepository;
