//! Presentation Layer
//!
//! Gateway event dispatch and the HTTP health/metrics surface.

pub mod gateway;
pub mod http;
