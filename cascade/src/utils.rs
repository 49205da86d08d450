//! Small helpers for run ids and timestamps.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Generates a random v4 UUID for identifying a pipeline run.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Returns the current UTC time as an RFC 3339 string with microsecond
/// precision, e.g. `2026-08-30T12:34:56.123456Z`.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
