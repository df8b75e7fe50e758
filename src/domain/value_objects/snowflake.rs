//! Discord-style Snowflake ID implementation.
//!
//! Snowflake IDs are 64-bit integers with embedded timestamp information.
//! The platform sends them as JSON strings, storage keeps them as BIGINT.
//!
//! ## Structure
//!
//! ```text
//! 64                         22          17          12          0
//! +---------------------------+-----------+-----------+-----------+
//! |         timestamp         |  worker   |  process  |  sequence |
//! |          (42 bits)        |  (5 bits) |  (5 bits) |  (12 bits)|
//! +---------------------------+-----------+-----------+-----------+
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discord epoch: 2015-01-01T00:00:00Z in milliseconds
pub const DISCORD_EPOCH: u64 = 1420070400000;

/// A Discord-style Snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub i64);

impl Snowflake {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Build the smallest snowflake minted at `timestamp_ms`.
    pub fn from_timestamp(timestamp_ms: u64) -> Self {
        Self((timestamp_ms.saturating_sub(DISCORD_EPOCH) << 22) as i64)
    }

    /// Milliseconds since the Unix epoch at which this ID was minted.
    pub fn timestamp(&self) -> u64 {
        ((self.0 as u64) >> 22) + DISCORD_EPOCH
    }

    /// Get the timestamp as a DateTime.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp() as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// How long ago this ID was minted, relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at())
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for i64 {
    fn from(snowflake: Snowflake) -> Self {
        snowflake.0
    }
}

/// Serde helpers for snowflakes sent as JSON strings (or bare numbers).
///
/// ```rust,ignore
/// #[serde(with = "crate::domain::snowflake_str")]
/// pub id: i64,
/// ```
pub mod snowflake_str {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

/// Optional variant of [`snowflake_str`].
pub mod snowflake_str_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::snowflake_str")] i64);

        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}
