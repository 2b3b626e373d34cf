/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Lifetime of a minted token or code.
pub type Lifetime = chrono::Duration;

/// The current time truncated to millisecond precision.
///
/// Every storage engine round-trips milliseconds, so anything minted from this
/// value compares equal after being stored and read back.
pub fn now_millis() -> Timestamp {
    truncate_millis(chrono::Utc::now())
}

/// Drop sub-millisecond precision from a timestamp.
pub fn truncate_millis(ts: Timestamp) -> Timestamp {
    chrono::DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

/// Rebuild a timestamp from milliseconds since the Unix epoch.
pub fn from_millis(millis: i64) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp_millis(millis)
}

/// Generate a fresh random token value (UUID v4, hyphenated).
pub fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
