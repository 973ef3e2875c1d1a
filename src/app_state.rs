//! Implements a struct that holds the state of the server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection holding the statements table.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The directory that generated chart images are written to and served
    /// from.
    pub chart_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the statements
    /// table. Chart images will be written to `chart_dir`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, chart_dir: PathBuf) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            chart_dir,
        })
    }
}
