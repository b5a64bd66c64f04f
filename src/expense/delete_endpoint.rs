//! Defines the endpoint for deleting an expense.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    Error,
    db::lock_connection,
    expense::{
        list_endpoints::{ExpenseState, UserQuery},
        service::delete_expense,
    },
};

/// The response body when an expense was deleted.
pub const DELETED_MESSAGE: &str = "Deleted";
/// The response body when nothing was deleted.
pub const DELETE_FAILED_MESSAGE: &str = "Error occured";

/// The expense to delete. Other expense fields in the body are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteExpenseBody {
    /// The public ID of the expense.
    #[serde(alias = "external_id")]
    pub external_id: String,
}

/// A route handler for deleting one of a user's expenses, responds with plain text.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<UserQuery>,
    payload: Result<Json<DeleteExpenseBody>, JsonRejection>,
) -> Response {
    let result = payload
        .map_err(|rejection| Error::MalformedPayload(rejection.body_text()))
        .and_then(|Json(body)| {
            let connection = lock_connection(&state.db_connection)?;
            delete_expense(&query.user_id, &body.external_id, &connection)
        });

    match result {
        Ok(0) => (StatusCode::BAD_REQUEST, DELETE_FAILED_MESSAGE).into_response(),
        Ok(_) => (StatusCode::OK, DELETED_MESSAGE).into_response(),
        Err(error) => {
            tracing::error!("could not delete expense: {error}");
            (StatusCode::BAD_REQUEST, DELETE_FAILED_MESSAGE).into_response()
        }
    }
}
