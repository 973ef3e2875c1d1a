//! Creates and populates the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, statement::Statement};

/// Create the application's database tables if they do not exist.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    transaction.execute(
        "CREATE TABLE IF NOT EXISTS statements (
            id INTEGER PRIMARY KEY,
            txn_date TEXT NOT NULL,
            DrCr TEXT NOT NULL,
            amount REAL NOT NULL,
            balance REAL NOT NULL,
            user_name TEXT NOT NULL
        )",
        (),
    )?;

    transaction.commit()?;

    Ok(())
}

/// Insert `statement` into the statements table.
///
/// The dashboard itself only ever reads the table. This function exists for
/// seeding databases (see the `create_test_db` binary) and for tests.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_statement(statement: &Statement, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO statements (txn_date, DrCr, amount, balance, user_name)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            statement.txn_date,
            &statement.flag,
            statement.amount,
            statement.balance,
            &statement.user_name,
        ),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::statement::Statement;

    use super::{create_statement, initialize};

    #[test]
    fn initialize_creates_statements_table() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'statements'",
                (),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn create_statement_round_trips_fields() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let statement = Statement {
            txn_date: date!(2025 - 03 - 14),
            flag: "Db".to_owned(),
            amount: 45.50,
            balance: 954.50,
            user_name: "alice".to_owned(),
        };

        create_statement(&statement, &conn).unwrap();

        let (flag, balance, user_name): (String, f64, String) = conn
            .query_row(
                "SELECT DrCr, balance, user_name FROM statements",
                (),
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(flag, "Db");
        assert_eq!(balance, 954.50);
        assert_eq!(user_name, "alice");
    }
}
