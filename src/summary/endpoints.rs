//! Route handlers for the grouped counts and summaries of a user's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    db::lock_connection,
    summary::queries::{count_by_timeframe, merchant_summary, user_summary},
    time_range::TimeRange,
    timezone::LocalTimezone,
};

/// The state needed to summarize expenses.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone whose calendar dates are used to bucket expenses.
    pub local_timezone: LocalTimezone,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone,
        }
    }
}

/// Query parameters for counting expenses per time frame.
#[derive(Debug, Deserialize)]
pub struct CountQuery {
    /// The user whose expenses are counted.
    pub user_id: String,
    /// One of day, week, month or year, in any case.
    pub time_frame: String,
    /// The start of the range in Unix milliseconds, inclusive.
    pub start_date: i64,
    /// The end of the range in Unix milliseconds, exclusive.
    pub end_date: i64,
}

/// Query parameters for summarizing expenses per merchant.
#[derive(Debug, Deserialize)]
pub struct MerchantSummaryQuery {
    /// The user whose expenses are summarized.
    pub user_id: String,
    /// The start of the range in Unix milliseconds, inclusive.
    pub start_date: i64,
    /// The end of the range in Unix milliseconds, exclusive.
    pub end_date: i64,
}

/// Query parameters identifying the user to summarize.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// The user whose expenses are summarized.
    pub user_id: String,
}

/// A route handler for counting a user's expenses per day, week, month or year.
///
/// Responds with `400 Bad Request` for an unknown time frame.
pub async fn get_expense_count_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<CountQuery>,
) -> Response {
    TimeRange::from_millis(query.start_date, query.end_date)
        .and_then(|range| {
            let connection = lock_connection(&state.db_connection)?;
            count_by_timeframe(
                &query.user_id,
                &query.time_frame,
                range,
                state.local_timezone,
                &connection,
            )
        })
        .map(Json)
        .into_response()
}

/// A route handler for totalling a user's expenses per merchant.
pub async fn get_merchant_summary_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<MerchantSummaryQuery>,
) -> Response {
    TimeRange::from_millis(query.start_date, query.end_date)
        .and_then(|range| {
            let connection = lock_connection(&state.db_connection)?;
            merchant_summary(&query.user_id, range, &connection)
        })
        .map(Json)
        .into_response()
}

/// A route handler for the headline statistics of all of a user's expenses.
///
/// Responds with `204 No Content` if the user has no expenses.
pub async fn get_user_summary_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    lock_connection(&state.db_connection)
        .and_then(|connection| user_summary(&query.user_id, state.local_timezone, &connection))
        .map(Json)
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        AppState, endpoints,
        expense::{NewExpense, create_expense},
        summary::{
            MerchantSummary, TimeframeCount, UserSummary,
            endpoints::{
                get_expense_count_endpoint, get_merchant_summary_endpoint,
                get_user_summary_endpoint,
            },
        },
        time_range::to_unix_millis,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "Asia/Kolkata").unwrap();

        {
            let connection = state.db_connection.lock().unwrap();
            for (amount, merchant, created_at) in [
                (10.0, "A", datetime!(2024-01-01 06:30 UTC)),
                (30.0, "B", datetime!(2024-01-01 06:30 UTC)),
                (5.0, "A", datetime!(2024-01-02 06:30 UTC)),
            ] {
                create_expense(
                    NewExpense {
                        user_id: Some("u1".to_owned()),
                        amount,
                        merchant: merchant.to_owned(),
                        created_at: Some(created_at),
                        ..Default::default()
                    },
                    &connection,
                )
                .unwrap();
            }
        }

        let app = Router::new()
            .route(endpoints::EXPENSE_COUNT, get(get_expense_count_endpoint))
            .route(
                endpoints::MERCHANT_SUMMARY,
                get(get_merchant_summary_endpoint),
            )
            .route(endpoints::USER_SUMMARY, get(get_user_summary_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn start_of_2024() -> i64 {
        to_unix_millis(datetime!(2024-01-01 00:00 +05:30))
    }

    fn end_of_2024() -> i64 {
        to_unix_millis(datetime!(2025-01-01 00:00 +05:30))
    }

    #[tokio::test]
    async fn counts_expenses_per_day() {
        let server = get_test_server();

        let response = server
            .get(endpoints::EXPENSE_COUNT)
            .add_query_param("user_id", "u1")
            .add_query_param("time_frame", "day")
            .add_query_param("start_date", start_of_2024())
            .add_query_param("end_date", end_of_2024())
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Vec<TimeframeCount>>(),
            vec![
                TimeframeCount {
                    time_period: "2024-01-01".to_owned(),
                    count: 2,
                    total_amount: 40.0,
                },
                TimeframeCount {
                    time_period: "2024-01-02".to_owned(),
                    count: 1,
                    total_amount: 5.0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn unknown_time_frame_is_bad_request() {
        let server = get_test_server();

        let response = server
            .get(endpoints::EXPENSE_COUNT)
            .add_query_param("user_id", "u1")
            .add_query_param("time_frame", "decade")
            .add_query_param("start_date", start_of_2024())
            .add_query_param("end_date", end_of_2024())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summarizes_merchants() {
        let server = get_test_server();

        let response = server
            .get(endpoints::MERCHANT_SUMMARY)
            .add_query_param("user_id", "u1")
            .add_query_param("start_date", start_of_2024())
            .add_query_param("end_date", end_of_2024())
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Vec<MerchantSummary>>(),
            vec![
                MerchantSummary {
                    merchant: "B".to_owned(),
                    count: 1,
                    total_amount: 30.0,
                },
                MerchantSummary {
                    merchant: "A".to_owned(),
                    count: 2,
                    total_amount: 15.0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn summarizes_user() {
        let server = get_test_server();

        let response = server
            .get(endpoints::USER_SUMMARY)
            .add_query_param("user_id", "u1")
            .await;

        response.assert_status_ok();
        let summary = response.json::<UserSummary>();
        assert_eq!(summary.largest_expense.map(|e| e.amount), Some(30.0));
        assert_eq!(summary.average_daily_expense, 22.5);
        assert_eq!(summary.top_merchant.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn summary_uses_camel_case_keys() {
        let server = get_test_server();

        let response = server
            .get(endpoints::USER_SUMMARY)
            .add_query_param("user_id", "u1")
            .await;

        let body = response.json::<serde_json::Value>();
        assert!(body.get("largestExpense").is_some());
        assert!(body.get("averageDailyExpense").is_some());
        assert!(body.get("topMerchant").is_some());
    }

    #[tokio::test]
    async fn summary_of_user_without_expenses_is_no_content() {
        let server = get_test_server();

        let response = server
            .get(endpoints::USER_SUMMARY)
            .add_query_param("user_id", "nobody")
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(response.text(), "");
    }
}
