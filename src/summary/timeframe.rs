//! The calendar granularities used to bucket expenses and their bucket labels.

use std::str::FromStr;

use time::Date;

use crate::Error;

/// A calendar granularity for grouping expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// Buckets labelled `YYYY-MM-DD`.
    Day,
    /// ISO 8601 weeks, labelled `YYYY-Www` using the ISO week-numbering year.
    Week,
    /// Buckets labelled `YYYY-MM`.
    Month,
    /// Buckets labelled `YYYY`.
    Year,
}

impl Timeframe {
    /// The label of the bucket that `date` falls in.
    ///
    /// Labels sort lexicographically in chronological order.
    pub fn bucket_label(self, date: Date) -> String {
        match self {
            Self::Day => format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
            Self::Week => {
                let (year, week, _) = date.to_iso_week_date();
                format!("{year:04}-W{week:02}")
            }
            Self::Month => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
            Self::Year => format!("{:04}", date.year()),
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(Error::InvalidTimeframe(value.to_owned())),
        }
    }
}
