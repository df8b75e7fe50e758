//! Application Layer
//!
//! Orchestrates the flow of data between the presentation layer, the domain
//! rules and the infrastructure ports.

pub mod services;
