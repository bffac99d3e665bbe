/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Milliseconds since the Unix epoch, the unit used on the wire.
pub fn unix_millis(ts: &Timestamp) -> i64 {
    ts.timestamp_millis()
}
