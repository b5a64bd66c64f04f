//! Defines the app level error type and its conversion into HTTP responses.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The time frame used to group expenses is not one of day, week, month
    /// or year.
    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),

    /// A summary was requested for a user that has no expenses.
    ///
    /// Request handlers should respond with "no content" rather than treat
    /// this as a failure.
    #[error("there are no expenses to summarize")]
    NoExpenses,

    /// A query parameter holding epoch milliseconds is outside the range of
    /// representable date-times.
    #[error("{0} is not a valid timestamp in milliseconds")]
    InvalidTimestamp(i64),

    /// An expense amount was negative, NaN, infinite or too large to total.
    #[error("{0} is not a valid expense amount")]
    InvalidAmount(f64),

    /// An expense was submitted without the user it belongs to.
    #[error("the expense does not specify a user ID")]
    MissingUserId,

    /// The specified external ID already exists in the database.
    #[error("the external ID already exists in the database")]
    DuplicateExternalId,

    /// Tried to update an expense that does not exist for the user.
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// An expense payload could not be parsed as JSON.
    #[error("could not parse expense payload: {0}")]
    MalformedPayload(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("expense.external_id") =>
            {
                Error::DuplicateExternalId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND.into_response(),
            Error::NoExpenses => StatusCode::NO_CONTENT.into_response(),
            Error::InvalidTimeframe(_)
            | Error::InvalidTimestamp(_)
            | Error::InvalidAmount(_)
            | Error::MissingUserId
            | Error::DuplicateExternalId
            | Error::MalformedPayload(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Error::UpdateMissingExpense => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
