//! # Proxy Bot Library
//!
//! This crate re-sends chat messages on behalf of the members of a plural
//! system:
//! - Gateway events arrive over Redis pub/sub
//! - Matching messages are re-sent through a channel webhook as the member
//! - The trigger-to-proxy linkage is stored in PostgreSQL
//! - The original message is deleted shortly after
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, matching rules and port traits
//! - **Application Layer**: The proxy pipeline
//! - **Infrastructure Layer**: Database, cache and platform implementations
//! - **Presentation Layer**: Gateway dispatch and health/metrics endpoints
//!
//! ## Module Structure
//!
//! ```text
//! proxy_bot/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, matching rules, ports
//! +-- application/    Proxy pipeline service
//! +-- infrastructure/ PostgreSQL, Redis and REST implementations
//! +-- presentation/   Gateway dispatcher and HTTP routes
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Proxy pipeline
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - Gateway dispatch and HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
