//! Half-open ranges of instants used to filter expenses by creation time.

use time::OffsetDateTime;

use crate::Error;

/// The instants from `start` (inclusive) up to `end` (exclusive).
///
/// Both the SQL queries and the in-memory aggregation use this convention so
/// that they agree on which expenses fall inside a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// The first instant in the range.
    pub start: OffsetDateTime,
    /// The first instant after the range.
    pub end: OffsetDateTime,
}

impl TimeRange {
    /// Create a range from Unix timestamps in milliseconds, as sent by clients.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimestamp] if either timestamp cannot be
    /// represented as a date-time.
    pub fn from_millis(start_ms: i64, end_ms: i64) -> Result<Self, Error> {
        Ok(Self {
            start: from_unix_millis(start_ms)?,
            end: from_unix_millis(end_ms)?,
        })
    }

    /// Whether `instant` falls inside the range.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Convert Unix milliseconds to a UTC date-time.
///
/// # Errors
/// Returns [Error::InvalidTimestamp] if `millis` is out of range.
pub fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| Error::InvalidTimestamp(millis))
}

/// Convert a date-time to Unix milliseconds, truncating sub-millisecond precision.
pub fn to_unix_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}
