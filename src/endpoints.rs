//! The API endpoints URIs.

/// The route to list all of a user's expenses.
pub const ALL_EXPENSES: &str = "/expense/v1/all";
/// The route to list a user's expenses within a date range.
pub const RANGE_EXPENSES: &str = "/expense/v1/rangeBasedExpense";
/// The route to list a user's expenses at a merchant within a date range.
pub const MERCHANT_RANGE_EXPENSES: &str = "/expense/v1/merchant/rangeBasedExpense";
/// The route to create an expense.
pub const ADD_EXPENSE: &str = "/expense/v1/addExpense";
/// The route to update an expense.
pub const UPDATE_EXPENSE: &str = "/expense/v1/updateExpense";
/// The route to delete an expense.
pub const DELETE_EXPENSE: &str = "/expense/v1/deleteExpense";
/// The route to count expenses per day, week, month or year.
pub const EXPENSE_COUNT: &str = "/expense/v1/count";
/// The route to summarize expenses per merchant.
pub const MERCHANT_SUMMARY: &str = "/expense/v1/merchant-summary";
/// The route to summarize all of a user's expenses.
pub const USER_SUMMARY: &str = "/expense/v1/summary";
