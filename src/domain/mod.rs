//! # Domain Layer
//!
//! The domain layer contains the proxy matching rules and the contracts the
//! pipeline depends on. It is independent of any external frameworks or
//! infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: members, proxy tags, message context, trigger messages
//! - **value_objects**: Snowflake, Permissions
//! - **services**: pure matching and validation rules
//! - **platform**: outbound chat platform ports
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Matching and validation are pure functions over snapshots
//! - Repository and platform traits define data access contracts

pub mod entities;
pub mod platform;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
