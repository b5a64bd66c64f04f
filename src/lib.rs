//! An expense tracking service.
//!
//! This library provides a JSON REST API for recording a user's expenses,
//! listing them by date range and merchant, and summarizing them per day,
//! week, month, year or merchant. Expenses may also be ingested from a
//! message topic through the [spawn_expense_consumer] task.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod consumer;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod routing;
mod summary;
mod time_range;
mod timezone;

pub use app_state::AppState;
pub use consumer::{
    TOPIC_CHANNEL_CAPACITY, consume_message, publish_topic_file, spawn_expense_consumer,
};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{Expense, NewExpense, USER_ID_HEADER};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use summary::{MerchantSummary, TimeframeCount, UserSummary};
pub use timezone::{DEFAULT_TIMEZONE, LocalTimezone};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
