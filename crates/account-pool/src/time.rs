//! Timestamps for provisioning requests and results.
//!
//! Stored and exchanged as Unix epoch microseconds (`u64`); rendered for
//! people as RFC 3339 in UTC with whole seconds.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time in microseconds since the Unix epoch. A clock set before
/// the epoch reads as zero.
pub fn now_micros() -> u64 {
    u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0)
}

/// Time between two microsecond timestamps; zero if `end` precedes `start`.
pub fn micros_between(start: u64, end: u64) -> Duration {
    Duration::from_micros(end.saturating_sub(start))
}

/// Render a microsecond timestamp as e.g. `2026-03-01T12:00:05Z`.
/// Out-of-range values render as the epoch.
pub fn micros_to_rfc3339(micros: u64) -> String {
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
