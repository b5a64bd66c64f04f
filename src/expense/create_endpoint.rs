//! Defines the endpoint for creating a new expense.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    db::lock_connection,
    expense::{NewExpense, list_endpoints::ExpenseState, service::create_expense},
};

/// The header carrying the ID of the user making a request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Get the user ID from the `X-User-Id` header, if present and not blank.
pub(crate) fn user_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user_id| !user_id.is_empty())
        .map(str::to_owned)
}

/// A route handler for creating a new expense for the user in the `X-User-Id` header.
///
/// Responds with `true` on success and `400 Bad Request` with `false` otherwise.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    headers: HeaderMap,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Response {
    let result = parse_new_expense(&headers, payload).and_then(|new_expense| {
        let connection = lock_connection(&state.db_connection)?;
        create_expense(new_expense, &connection)
    });

    match result {
        Ok(expense) => {
            tracing::info!(
                "created expense {} for user {}",
                expense.external_id,
                expense.user_id
            );
            (StatusCode::OK, Json(true)).into_response()
        }
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            (StatusCode::BAD_REQUEST, Json(false)).into_response()
        }
    }
}

fn parse_new_expense(
    headers: &HeaderMap,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Result<NewExpense, Error> {
    let user_id = user_id_from_headers(headers).ok_or(Error::MissingUserId)?;
    let Json(mut new_expense) =
        payload.map_err(|rejection| Error::MalformedPayload(rejection.body_text()))?;
    new_expense.user_id = Some(user_id);

    Ok(new_expense)
}
