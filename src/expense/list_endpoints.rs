//! Route handlers for listing a user's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    expense::{
        Expense,
        service::{list_expenses, list_expenses_in_range, list_merchant_expenses_in_range},
    },
    time_range::TimeRange,
};

/// The state needed to read and write expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters identifying a user.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// The user whose expenses are requested.
    pub user_id: String,
}

/// Query parameters for a user's expenses within a date range.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// The user whose expenses are requested.
    pub user_id: String,
    /// The start of the range in Unix milliseconds, inclusive.
    pub start_date: i64,
    /// The end of the range in Unix milliseconds, exclusive.
    pub end_date: i64,
}

/// Query parameters for a user's expenses at a merchant within a date range.
#[derive(Debug, Deserialize)]
pub struct MerchantRangeQuery {
    /// The user whose expenses are requested.
    pub user_id: String,
    /// The merchant to match exactly.
    pub merchant: String,
    /// The start of the range in Unix milliseconds, inclusive.
    pub start_date: i64,
    /// The end of the range in Unix milliseconds, exclusive.
    pub end_date: i64,
}

/// A route handler for listing all of a user's expenses.
pub async fn get_all_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<UserQuery>,
) -> Response {
    let result = lock_connection(&state.db_connection)
        .and_then(|connection| list_expenses(&query.user_id, &connection));

    into_list_response(result)
}

/// A route handler for listing a user's expenses within a date range.
pub async fn get_range_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let result = TimeRange::from_millis(query.start_date, query.end_date).and_then(|range| {
        let connection = lock_connection(&state.db_connection)?;
        list_expenses_in_range(&query.user_id, range, &connection)
    });

    into_list_response(result)
}

/// A route handler for listing a user's expenses at one merchant within a date range.
pub async fn get_merchant_range_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<MerchantRangeQuery>,
) -> Response {
    let result = TimeRange::from_millis(query.start_date, query.end_date).and_then(|range| {
        let connection = lock_connection(&state.db_connection)?;
        list_merchant_expenses_in_range(&query.user_id, &query.merchant, range, &connection)
    });

    into_list_response(result)
}

/// An empty list is a successful response. Any failure is reported as 404
/// Not Found with an empty body, which is what existing clients expect.
fn into_list_response(result: Result<Vec<Expense>, Error>) -> Response {
    match result {
        Ok(expenses) => Json(expenses).into_response(),
        Err(error) => {
            tracing::error!("could not list expenses: {error}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
