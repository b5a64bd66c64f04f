use std::{
    fs::OpenOptions,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_service::{
    AppState, DEFAULT_TIMEZONE, TOPIC_CHANNEL_CAPACITY, build_router, graceful_shutdown,
    logging_middleware, publish_topic_file, spawn_expense_consumer,
};

/// The REST API server for the expense service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// The address to serve the API from.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// The canonical name of the timezone used to group expenses by date.
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// File or FIFO of newline-delimited expense messages to ingest.
    #[arg(long)]
    topic_path: Option<PathBuf>,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .expect("Could not parse the server address.");

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let state = AppState::new(conn, &args.timezone).expect("Could not initialize the app state.");

    if let Some(topic_path) = args.topic_path {
        let (sender, receiver) = mpsc::channel(TOPIC_CHANNEL_CAPACITY);
        spawn_expense_consumer(state.db_connection.clone(), receiver);

        tokio::spawn(async move {
            match publish_topic_file(&topic_path, sender).await {
                Ok(count) => tracing::info!("published {count} messages from {topic_path:?}"),
                Err(error) => tracing::error!("could not read topic {topic_path:?}: {error}"),
            }
        });
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn setup_logging(log_path: &Path) {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the handlers.
        .on_failure(());

    router.layer(tracing_layer)
}
