use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, WormError};

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| WormError::Parse(format!("invalid duration {input}: {e}")))
}

/// Renders a lookback window as a Go duration for the query API's `since`
/// parameter: only `h`, `m` and `s` units, no spaces (`1h30m`, `24h`).
/// Sub-second precision is dropped; anything under a second becomes `1s`.
pub fn format_lookback(lookback: Duration) -> String {
    let total = lookback.as_secs();
    if total == 0 {
        return if lookback.is_zero() { "0s" } else { "1s" }.to_string();
    }

    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

/// Signed gap in seconds, with microsecond precision.
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let micros = (later - earlier).num_microseconds().unwrap_or(i64::MAX);
    micros as f64 / 1_000_000.0
}

/// Serde adapter for Jaeger `startTime`: integer microseconds since the epoch.
/// RFC 3339 strings are accepted on input.
pub mod unix_micros {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Micros(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        ts: &DateTime<Utc>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(ts.timestamp_micros())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Micros(v) => DateTime::from_timestamp_micros(v)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {v}"))),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| D::Error::custom(format!("invalid timestamp {s}: {e}"))),
        }
    }
}
