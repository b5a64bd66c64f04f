//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    time_range::{TimeRange, from_unix_millis, to_unix_millis},
};

// ============================================================================
// MODELS
// ============================================================================

/// The currency recorded for expenses that do not specify one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Money that a user spent at a merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The public, unique ID of the expense.
    pub external_id: String,
    /// The ID of the user that the expense belongs to.
    pub user_id: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The currency code of `amount`, e.g. "INR".
    pub currency: String,
    /// Where the money was spent.
    pub merchant: String,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// An expense that has not been stored yet.
///
/// This is the payload accepted over HTTP and from the expense topic. The
/// optional fields are filled in by [crate::expense::create_expense].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    /// The public ID to use, generated when absent.
    #[serde(default, alias = "external_id")]
    pub external_id: Option<String>,
    /// The owner of the expense. Overwritten by the `X-User-Id` header for HTTP requests.
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    /// The amount of money spent.
    pub amount: f64,
    /// The currency code, defaults to [DEFAULT_CURRENCY].
    #[serde(default)]
    pub currency: Option<String>,
    /// Where the money was spent.
    pub merchant: String,
    /// When the expense happened, defaults to the time it is stored.
    #[serde(
        default,
        alias = "created_at",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str = "external_id, user_id, amount, currency, merchant, created_at";

/// Insert a fully specified expense into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateExternalId] if an expense with the same external ID already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_expense(expense: &Expense, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO expense (external_id, user_id, amount, currency, merchant, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &expense.external_id,
            &expense.user_id,
            expense.amount,
            &expense.currency,
            &expense.merchant,
            to_unix_millis(expense.created_at),
        ),
    )?;

    Ok(())
}

/// Retrieve the expense with `external_id` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the user has no such expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    user_id: &str,
    external_id: &str,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = :user_id AND external_id = :external_id"
        ))?
        .query_row(
            &[(":user_id", user_id), (":external_id", external_id)],
            map_expense_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's expenses, oldest first.
pub fn get_expenses_by_user(user_id: &str, connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = :user_id
             ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(&[(":user_id", user_id)], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a user's expenses created inside `range`, oldest first.
pub fn get_expenses_by_user_in_range(
    user_id: &str,
    range: TimeRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
             ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(
            (
                user_id,
                to_unix_millis(range.start),
                to_unix_millis(range.end),
            ),
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a user's expenses at `merchant` created inside `range`, oldest first.
///
/// The merchant must match exactly, including case.
pub fn get_expenses_by_user_and_merchant_in_range(
    user_id: &str,
    merchant: &str,
    range: TimeRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
             WHERE user_id = ?1 AND merchant = ?2 AND created_at >= ?3 AND created_at < ?4
             ORDER BY created_at ASC, id ASC"
        ))?
        .query_map(
            (
                user_id,
                merchant,
                to_unix_millis(range.start),
                to_unix_millis(range.end),
            ),
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the amount, currency and merchant of a stored expense.
///
/// The creation time is never changed.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if the user has no expense with the external ID,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense_row(expense: &Expense, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET amount = ?1, currency = ?2, merchant = ?3
         WHERE user_id = ?4 AND external_id = ?5",
        (
            expense.amount,
            &expense.currency,
            &expense.merchant,
            &expense.user_id,
            &expense.external_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

type RowsAffected = usize;

/// Delete the expense with `external_id` if it belongs to `user_id`.
///
/// Returns the number of rows removed, which is zero when there is no match.
pub fn delete_expense_row(
    user_id: &str,
    external_id: &str,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM expense WHERE external_id = ?1 AND user_id = ?2",
            (external_id, user_id),
        )
        .map_err(|error| error.into())
}

/// Get the total number of expenses in the database.
#[cfg(test)]
pub fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL,
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            merchant TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_created
            ON expense(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_expense_user_merchant_created
            ON expense(user_id, merchant, created_at);",
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let external_id = row.get(0)?;
    let user_id = row.get(1)?;
    let amount = row.get(2)?;
    let currency = row.get(3)?;
    let merchant = row.get(4)?;
    let created_at_ms: i64 = row.get(5)?;
    let created_at = from_unix_millis(created_at_ms).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(error),
        )
    })?;

    Ok(Expense {
        external_id,
        user_id,
        amount,
        currency,
        merchant,
        created_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
