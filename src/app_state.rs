//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, timezone::LocalTimezone};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The timezone whose calendar dates are used to bucket expenses.
    pub local_timezone: LocalTimezone,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Kolkata".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone is unknown.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        let local_timezone = LocalTimezone::from_name(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
