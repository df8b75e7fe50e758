//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgMemberRepository** - proxy candidates with guild overrides applied
//! - **PgMessageContextRepository** - system, guild and autoproxy settings
//! - **PgProxiedMessageRepository** - trigger-to-proxy linkage rows
//!
//! ## Tables Read
//!
//! `accounts`, `systems`, `system_guild`, `members`, `member_guild`,
//! `servers`, `autoproxy`, `switches`, `switch_members`, `messages`.

pub mod context_repository;
pub mod member_repository;
pub mod message_repository;

pub use context_repository::PgMessageContextRepository;
pub use member_repository::PgMemberRepository;
pub use message_repository::PgProxiedMessageRepository;
