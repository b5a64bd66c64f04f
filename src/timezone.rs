//! Resolves the configured timezone used to turn instants into calendar dates.

use std::fmt;

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// The timezone used when none is configured: Indian Standard Time.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// A canonical IANA timezone, e.g. "Asia/Kolkata".
///
/// Expenses are bucketed by the calendar date they fall on in this zone, so
/// the same records produce the same buckets regardless of where the server
/// runs.
#[derive(Clone, Copy)]
pub struct LocalTimezone {
    name: &'static str,
    tz: &'static Tz,
}

impl LocalTimezone {
    /// Look up a timezone by its canonical name.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if `canonical_timezone` is not a known
    /// timezone name.
    pub fn from_name(canonical_timezone: &str) -> Result<Self, Error> {
        time_tz::timezones::get_by_name(canonical_timezone)
            .map(|tz| Self {
                name: tz.name(),
                tz,
            })
            .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))
    }

    /// The canonical name of the timezone.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The UTC offset in effect at `instant`.
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        self.tz.get_offset_utc(&instant).to_utc()
    }

    /// The local calendar date that `instant` falls on.
    pub fn local_date(&self, instant: OffsetDateTime) -> Date {
        instant.to_offset(self.offset_at(instant)).date()
    }
}

impl Default for LocalTimezone {
    fn default() -> Self {
        Self {
            name: DEFAULT_TIMEZONE,
            tz: time_tz::timezones::db::asia::KOLKATA,
        }
    }
}

impl fmt::Debug for LocalTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalTimezone").field(&self.name).finish()
    }
}

impl PartialEq for LocalTimezone {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
