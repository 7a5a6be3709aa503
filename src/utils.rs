//! Helper functions could be used in api/, front/, ...

use chrono::{SecondsFormat, Utc};

/// Current time as an ISO-8601 UTC string with milliseconds,
/// e.g. `2024-05-01T12:30:00.123Z`
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
