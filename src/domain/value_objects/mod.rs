//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Snowflake**: platform-style ID with embedded timestamp
//! - **Permissions**: 64-bit permission bitfield the bot holds in a channel

mod snowflake;
mod permissions;

pub use snowflake::*;
pub use permissions::*;
