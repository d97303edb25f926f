/// Helper utilities for the collector

use chrono::Utc;

/// Milliseconds since the Unix epoch, UTC.
pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
