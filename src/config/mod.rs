//! # Configuration Module
//!
//! This module handles application configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proxy_bot::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Deleting trigger messages after {:?}", settings.proxy.deletion_delay());
//! ```

mod settings;

pub use settings::*;
