//! Application Services
//!
//! Services that coordinate domain rules with the storage and platform ports.
//!
//! ## Available Services
//!
//! - **ProxyService**: the proxy pipeline from eligibility to trigger deletion

pub mod proxy_service;

pub use proxy_service::{AbortReason, ProxyPorts, ProxyService, ProxyStage};
