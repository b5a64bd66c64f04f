//! Ingests expenses published to the expense topic.
//!
//! Each message is a JSON-encoded [NewExpense] and goes through the same
//! create path as the HTTP endpoint. A message that cannot be parsed or
//! stored is logged and dropped; there are no retries.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};

use crate::{
    Error,
    db::lock_connection,
    expense::{Expense, NewExpense, create_expense},
};

/// How many messages may wait in the topic channel before publishers block.
pub const TOPIC_CHANNEL_CAPACITY: usize = 64;

/// Parse and store a single expense message.
///
/// # Errors
/// Returns [Error::MalformedPayload] if the message is not a valid expense,
/// or any error from [create_expense].
pub fn consume_message(payload: &[u8], db_connection: &Mutex<Connection>) -> Result<Expense, Error> {
    let new_expense: NewExpense = serde_json::from_slice(payload)
        .map_err(|error| Error::MalformedPayload(error.to_string()))?;
    let connection = lock_connection(db_connection)?;

    create_expense(new_expense, &connection)
}

/// Consume expense messages until every sender of `messages` is dropped.
///
/// The returned task resolves to the number of messages that were stored.
pub fn spawn_expense_consumer(
    db_connection: Arc<Mutex<Connection>>,
    mut messages: Receiver<Vec<u8>>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut stored = 0;

        while let Some(payload) = messages.recv().await {
            match consume_message(&payload, &db_connection) {
                Ok(expense) => {
                    stored += 1;
                    tracing::info!(
                        "ingested expense {} for user {}",
                        expense.external_id,
                        expense.user_id
                    );
                }
                Err(error) => {
                    tracing::error!(
                        "dropping expense message {:?}: {error}",
                        String::from_utf8_lossy(&payload)
                    );
                }
            }
        }

        tracing::debug!("expense topic closed after storing {stored} expenses");
        stored
    })
}

/// Publish each non-blank line of the newline-delimited JSON file at `path`
/// to `sender`.
///
/// Lines are sent as raw bytes, so a line that is not valid UTF-8 reaches the
/// consumer and is dropped there like any other malformed message.
///
/// `path` may be a FIFO, in which case this runs until the writer closes it.
/// Returns the number of messages published.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub async fn publish_topic_file(path: &Path, sender: Sender<Vec<u8>>) -> std::io::Result<usize> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).split(b'\n');
    let mut published = 0;

    while let Some(line) = lines.next_segment().await? {
        if line.trim_ascii().is_empty() {
            continue;
        }

        if sender.send(line).await.is_err() {
            tracing::warn!("expense consumer stopped, no longer reading {path:?}");
            break;
        }

        published += 1;
    }

    Ok(published)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use tokio::sync::mpsc;

    use crate::{
        Error,
        consumer::{
            TOPIC_CHANNEL_CAPACITY, consume_message, publish_topic_file, spawn_expense_consumer,
        },
        db::initialize,
        expense::list_expenses,
    };

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn consumes_message_with_defaults() {
        let db_connection = get_test_connection();

        let expense = consume_message(
            br#"{"userId": "u1", "amount": 99.0, "merchant": "Grocer"}"#,
            &db_connection,
        )
        .unwrap();

        assert_eq!(expense.currency, "INR");
        assert!(!expense.external_id.is_empty());
        assert_eq!(
            list_expenses("u1", &db_connection.lock().unwrap()),
            Ok(vec![expense])
        );
    }

    #[test]
    fn rejects_malformed_message() {
        let db_connection = get_test_connection();

        let result = consume_message(b"not json", &db_connection);

        assert!(matches!(result, Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn rejects_message_without_user() {
        let db_connection = get_test_connection();

        let result = consume_message(br#"{"amount": 1.0, "merchant": "Grocer"}"#, &db_connection);

        assert_eq!(result, Err(Error::MissingUserId));
    }

    #[tokio::test]
    async fn consumer_skips_bad_messages_and_keeps_going() {
        let db_connection = get_test_connection();
        let (sender, receiver) = mpsc::channel(TOPIC_CHANNEL_CAPACITY);
        let consumer = spawn_expense_consumer(db_connection.clone(), receiver);

        for payload in [
            r#"{"userId": "u1", "amount": 1.0, "merchant": "A"}"#,
            "{",
            r#"{"userId": "u1", "amount": -3.0, "merchant": "A"}"#,
            r#"{"user_id": "u1", "amount": 2.0, "merchant": "B", "currency": "USD"}"#,
        ] {
            sender.send(payload.as_bytes().to_vec()).await.unwrap();
        }
        drop(sender);

        assert_eq!(consumer.await.unwrap(), 2);
        let expenses = list_expenses("u1", &db_connection.lock().unwrap()).unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().any(|expense| expense.currency == "USD"));
    }

    #[tokio::test]
    async fn publishes_each_non_blank_line() {
        let path = std::env::temp_dir().join(format!("expense-topic-{}.ndjson", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "{\"userId\": \"u1\", \"amount\": 1.0, \"merchant\": \"A\"}\n\n   \n{\"userId\": \"u1\", \"amount\": 2.0, \"merchant\": \"B\"}\n",
        )
        .unwrap();
        let (sender, mut receiver) = mpsc::channel(TOPIC_CHANNEL_CAPACITY);

        let published = publish_topic_file(&path, sender).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        assert_eq!(published, 2);
        let mut received = Vec::new();
        while let Some(payload) = receiver.recv().await {
            received.push(String::from_utf8(payload).unwrap());
        }
        assert_eq!(received.len(), 2);
        assert!(received[1].contains("\"B\""));
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_later_messages() {
        let path = std::env::temp_dir().join(format!("expense-topic-{}.ndjson", uuid::Uuid::new_v4()));
        let mut contents = br#"{"userId": "u1", "amount": 1.0, "merchant": "A"}"#.to_vec();
        contents.extend_from_slice(b"\n{\"userId\": \"u1\", \"amount\": 2.0, \"merchant\": \"\xff\"}\n");
        contents.extend_from_slice(br#"{"userId": "u1", "amount": 3.0, "merchant": "C"}"#);
        std::fs::write(&path, contents).unwrap();
        let db_connection = get_test_connection();
        let (sender, receiver) = mpsc::channel(TOPIC_CHANNEL_CAPACITY);
        let consumer = spawn_expense_consumer(db_connection.clone(), receiver);

        let published = publish_topic_file(&path, sender).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        assert_eq!(published, 3);
        assert_eq!(consumer.await.unwrap(), 2);
        let merchants: Vec<String> = list_expenses("u1", &db_connection.lock().unwrap())
            .unwrap()
            .into_iter()
            .map(|expense| expense.merchant)
            .collect();
        assert!(merchants.contains(&"A".to_owned()));
        assert!(merchants.contains(&"C".to_owned()));
    }
}
