//! Loads a user's expenses and runs them through the aggregation functions.

use rusqlite::Connection;

use crate::{
    Error,
    expense::{list_expenses, list_expenses_in_range},
    summary::{
        Timeframe,
        aggregation::{
            MerchantSummary, TimeframeCount, UserSummary, group_by_merchant, group_by_timeframe,
            summarize,
        },
    },
    time_range::TimeRange,
    timezone::LocalTimezone,
};

/// Count and total the user's expenses in `range` per `timeframe` bucket.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTimeframe] if `timeframe` is not day, week, month or year,
/// - or [Error::SqlError] if the expenses could not be loaded.
pub fn count_by_timeframe(
    user_id: &str,
    timeframe: &str,
    range: TimeRange,
    timezone: LocalTimezone,
    connection: &Connection,
) -> Result<Vec<TimeframeCount>, Error> {
    let timeframe: Timeframe = timeframe.parse()?;
    let expenses = list_expenses_in_range(user_id, range, connection)?;

    Ok(group_by_timeframe(&expenses, timeframe, range, timezone))
}

/// Group the user's expenses in `range` by merchant, largest total first.
pub fn merchant_summary(
    user_id: &str,
    range: TimeRange,
    connection: &Connection,
) -> Result<Vec<MerchantSummary>, Error> {
    let expenses = list_expenses_in_range(user_id, range, connection)?;

    Ok(group_by_merchant(&expenses))
}

/// Summarize all of the user's expenses.
///
/// # Errors
/// Returns [Error::NoExpenses] if the user has no expenses.
pub fn user_summary(
    user_id: &str,
    timezone: LocalTimezone,
    connection: &Connection,
) -> Result<UserSummary, Error> {
    let expenses = list_expenses(user_id, connection)?;

    summarize(&expenses, timezone)
}
