//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Health/metrics listener
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration (event source and channel cache)
    pub redis: RedisSettings,

    /// Chat platform REST API
    pub discord: DiscordSettings,

    /// Proxy pipeline tuning
    pub proxy: ProxySettings,

    /// Emoji used in user-facing diagnostics
    pub emojis: EmojiSettings,

    /// Shutdown behaviour
    pub shutdown: ShutdownSettings,

    /// Log output
    pub telemetry: TelemetrySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,

    /// Pub/sub channel the gateway publishes dispatch packets on
    pub event_channel: String,

    /// Key prefix of cached channel records
    pub channel_key_prefix: String,
}

/// Chat platform REST configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordSettings {
    /// REST API base URL, without trailing slash
    pub api_base_url: String,

    /// Bot token
    pub token: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Shortest proxy name the platform accepts for a webhook username
pub const MIN_PROXY_NAME_LENGTH: usize = 2;

/// Proxy pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    /// Shortest accepted proxy name, at least [`MIN_PROXY_NAME_LENGTH`]
    pub min_name_length: usize,

    /// Longest accepted proxy name (platform webhook username limit)
    pub max_name_length: usize,

    /// Delay before the trigger message is deleted
    pub deletion_delay_ms: u64,

    /// Latch expiry in seconds, 0 disables expiry
    pub latch_timeout_secs: u64,

    /// Longest content a webhook message may carry
    pub max_content_length: usize,

    /// Name of the per-channel webhook used for proxying
    pub webhook_name: String,
}

/// Emoji used in user-facing diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct EmojiSettings {
    pub error: String,
    pub warn: String,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownSettings {
    /// Maximum time to wait for in-flight pipelines
    pub drain_timeout_secs: u64,

    /// Maximum time to wait, after draining, for sent proxies to finish
    /// recording and deleting their trigger
    pub completion_timeout_secs: u64,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Emit JSON log lines instead of the human-readable format
    pub json: bool,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the loaded values are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("redis.event_channel", "evt")?
            .set_default("redis.channel_key_prefix", "channel:")?
            .set_default("discord.api_base_url", "https://discord.com/api/v10")?
            .set_default("discord.request_timeout_secs", 15)?
            .set_default("proxy.min_name_length", MIN_PROXY_NAME_LENGTH as i64)?
            .set_default("proxy.max_name_length", 80)?
            .set_default("proxy.deletion_delay_ms", 1000)?
            .set_default("proxy.latch_timeout_secs", 6 * 60 * 60)?
            .set_default("proxy.max_content_length", 2000)?
            .set_default("proxy.webhook_name", "Proxy Webhook")?
            .set_default("emojis.error", "\u{274C}")?
            .set_default("emojis.warn", "\u{26A0}")?
            .set_default("shutdown.drain_timeout_secs", 10)?
            .set_default("shutdown.completion_timeout_secs", 30)?
            .set_default("telemetry.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__PROXY__DELETION_DELAY_MS=500 -> proxy.deletion_delay_ms = 500
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("discord.token", std::env::var("DISCORD_TOKEN").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(ConfigError::Message("discord.token must be set".into()));
        }
        self.proxy.validate()
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ProxySettings {
    /// Check name bounds are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_name_length < MIN_PROXY_NAME_LENGTH {
            return Err(ConfigError::Message(format!(
                "proxy.min_name_length must be at least {}. Current value: {}",
                MIN_PROXY_NAME_LENGTH, self.min_name_length
            )));
        }
        if self.min_name_length > self.max_name_length {
            return Err(ConfigError::Message(format!(
                "proxy.min_name_length ({}) exceeds proxy.max_name_length ({})",
                self.min_name_length, self.max_name_length
            )));
        }
        Ok(())
    }

    pub fn deletion_delay(&self) -> Duration {
        Duration::from_millis(self.deletion_delay_ms)
    }

    /// Latch expiry, `None` when latches never expire.
    pub fn latch_timeout(&self) -> Option<Duration> {
        (self.latch_timeout_secs > 0).then(|| Duration::from_secs(self.latch_timeout_secs))
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            min_name_length: MIN_PROXY_NAME_LENGTH,
            max_name_length: 80,
            deletion_delay_ms: 1000,
            latch_timeout_secs: 6 * 60 * 60,
            max_content_length: 2000,
            webhook_name: "Proxy Webhook".into(),
        }
    }
}

impl Default for EmojiSettings {
    fn default() -> Self {
        Self {
            error: "\u{274C}".into(),
            warn: "\u{26A0}".into(),
        }
    }
}
