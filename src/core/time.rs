//! Timestamp handling
//!
//! Timestamps are local naive date-times. They serialize as ISO-8601 without
//! an offset; the fractional part is only written when non-zero, so
//! `2024-01-15T10:30:00` stays as-is and sub-second values round-trip exactly.

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Serialization format for timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Get the current local time, truncated to microseconds
///
/// At most six fractional digits are written, which other ISO-8601 readers
/// of the same cache (e.g. Python's `fromisoformat`) accept.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Format a timestamp for storage
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp
pub fn parse_timestamp(s: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
}

/// Serde adapter for `Option<NaiveDateTime>` fields
pub mod optional_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::parse_timestamp(&s)
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid timestamp {s:?}: {e}"))),
            None => Ok(None),
        }
    }
}
