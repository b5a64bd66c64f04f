//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use crate::{
    AppState, endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_all_expenses_endpoint,
        get_merchant_range_expenses_endpoint, get_range_expenses_endpoint,
        update_expense_endpoint,
    },
    summary::{
        get_expense_count_endpoint, get_merchant_summary_endpoint, get_user_summary_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let expense_routes = Router::new()
        .route(endpoints::ALL_EXPENSES, get(get_all_expenses_endpoint))
        .route(endpoints::RANGE_EXPENSES, get(get_range_expenses_endpoint))
        .route(
            endpoints::MERCHANT_RANGE_EXPENSES,
            get(get_merchant_range_expenses_endpoint),
        )
        .route(endpoints::ADD_EXPENSE, post(create_expense_endpoint))
        .route(endpoints::UPDATE_EXPENSE, put(update_expense_endpoint))
        .route(endpoints::DELETE_EXPENSE, delete(delete_expense_endpoint));

    let summary_routes = Router::new()
        .route(endpoints::EXPENSE_COUNT, get(get_expense_count_endpoint))
        .route(
            endpoints::MERCHANT_SUMMARY,
            get(get_merchant_summary_endpoint),
        )
        .route(endpoints::USER_SUMMARY, get(get_user_summary_endpoint));

    expense_routes
        .merge(summary_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
