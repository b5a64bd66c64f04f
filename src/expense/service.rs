//! Validation, defaulting and orchestration for creating, updating, deleting
//! and listing expenses.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    expense::core::{
        DEFAULT_CURRENCY, Expense, NewExpense, delete_expense_row, get_expense,
        get_expenses_by_user, get_expenses_by_user_and_merchant_in_range,
        get_expenses_by_user_in_range, insert_expense, update_expense_row,
    },
    time_range::{TimeRange, from_unix_millis, to_unix_millis},
};

/// The changes to apply to a stored expense.
///
/// Blank `currency` and `merchant` values leave the stored values untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    /// The public ID of the expense to update.
    #[serde(alias = "external_id")]
    pub external_id: String,
    /// The owner of the expense. Overwritten by the `X-User-Id` header for HTTP requests.
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    /// The new amount.
    pub amount: f64,
    /// The new currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// The new merchant.
    #[serde(default)]
    pub merchant: Option<String>,
}

/// Fill in the defaults for `new_expense` and store it.
///
/// An absent currency becomes [DEFAULT_CURRENCY], an absent external ID is
/// replaced with a random UUID and an absent creation time becomes now.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingUserId] if the expense has no user ID,
/// - [Error::InvalidAmount] if the amount is negative, above [MAX_AMOUNT] or not finite,
/// - [Error::DuplicateExternalId] if the external ID is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let user_id = new_expense
        .user_id
        .filter(|user_id| !user_id.trim().is_empty())
        .ok_or(Error::MissingUserId)?;
    validate_amount(new_expense.amount)?;

    let created_at = new_expense
        .created_at
        .unwrap_or_else(OffsetDateTime::now_utc);

    let expense = Expense {
        external_id: new_expense
            .external_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        user_id,
        amount: new_expense.amount,
        currency: new_expense
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        merchant: new_expense.merchant,
        // Stored with millisecond precision, so return what will be read back.
        created_at: from_unix_millis(to_unix_millis(created_at))?,
    };

    insert_expense(&expense, connection)?;

    Ok(expense)
}

/// Apply `update` to the user's expense with the same external ID.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingUserId] if the update has no user ID,
/// - [Error::InvalidAmount] if the amount is negative, above [MAX_AMOUNT] or not finite,
/// - [Error::UpdateMissingExpense] if the user has no such expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(update: ExpenseUpdate, connection: &Connection) -> Result<Expense, Error> {
    let user_id = update.user_id.ok_or(Error::MissingUserId)?;
    validate_amount(update.amount)?;

    let mut expense = match get_expense(&user_id, &update.external_id, connection) {
        Ok(expense) => expense,
        Err(Error::NotFound) => return Err(Error::UpdateMissingExpense),
        Err(error) => return Err(error),
    };

    if let Some(currency) = non_blank(update.currency) {
        expense.currency = currency;
    }
    if let Some(merchant) = non_blank(update.merchant) {
        expense.merchant = merchant;
    }
    expense.amount = update.amount;

    update_expense_row(&expense, connection)?;

    Ok(expense)
}

/// Delete the user's expense with `external_id`.
///
/// Returns how many expenses were deleted. An unknown external ID, or one
/// owned by another user, deletes nothing and is not an error.
pub fn delete_expense(
    user_id: &str,
    external_id: &str,
    connection: &Connection,
) -> Result<usize, Error> {
    let rows_affected = delete_expense_row(user_id, external_id, connection)?;

    if rows_affected == 0 {
        tracing::debug!("no expense {external_id} to delete for user {user_id}");
    }

    Ok(rows_affected)
}

/// All of the user's expenses, oldest first.
pub fn list_expenses(user_id: &str, connection: &Connection) -> Result<Vec<Expense>, Error> {
    get_expenses_by_user(user_id, connection)
}

/// The user's expenses created inside `range`, oldest first.
pub fn list_expenses_in_range(
    user_id: &str,
    range: TimeRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    get_expenses_by_user_in_range(user_id, range, connection)
}

/// The user's expenses at `merchant` created inside `range`, oldest first.
pub fn list_merchant_expenses_in_range(
    user_id: &str,
    merchant: &str,
    range: TimeRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    get_expenses_by_user_and_merchant_in_range(user_id, merchant, range, connection)
}

/// The largest amount a single expense may have.
///
/// Totals over any realistic number of expenses stay finite below this.
pub const MAX_AMOUNT: f64 = 1e15;

fn validate_amount(amount: f64) -> Result<(), Error> {
    if (0.0..=MAX_AMOUNT).contains(&amount) {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
