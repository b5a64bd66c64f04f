//! Defines the endpoint for updating an existing expense.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    db::lock_connection,
    expense::{
        create_endpoint::user_id_from_headers,
        list_endpoints::ExpenseState,
        service::{ExpenseUpdate, update_expense},
    },
};

/// A route handler for updating one of the `X-User-Id` user's expenses.
///
/// Responds with `true` on success, `404 Not Found` with `false` if the user
/// has no such expense and `400 Bad Request` with `false` otherwise.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    headers: HeaderMap,
    payload: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Response {
    let Some(user_id) = user_id_from_headers(&headers) else {
        tracing::error!("could not update expense: {}", Error::MissingUserId);
        return (StatusCode::BAD_REQUEST, Json(false)).into_response();
    };

    let Json(mut update) = match payload {
        Ok(update) => update,
        Err(rejection) => {
            tracing::error!("could not update expense: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(false)).into_response();
        }
    };
    update.user_id = Some(user_id);

    let result = lock_connection(&state.db_connection)
        .and_then(|connection| update_expense(update, &connection));

    match result {
        Ok(expense) => {
            tracing::info!(
                "updated expense {} for user {}",
                expense.external_id,
                expense.user_id
            );
            (StatusCode::OK, Json(true)).into_response()
        }
        Err(Error::UpdateMissingExpense) => (StatusCode::NOT_FOUND, Json(false)).into_response(),
        Err(error) => {
            tracing::error!("could not update expense: {error}");
            (StatusCode::BAD_REQUEST, Json(false)).into_response()
        }
    }
}
