//! Builds and runs the filtered query against the statements table.

use rusqlite::{Connection, params_from_iter};

use crate::Error;

use super::{filter::StatementFilter, models::Statement};

/// Build the SQL query and parameter list for `filter`.
///
/// A clause is appended for each present filter field; the query always ends
/// with `ORDER BY txn_date ASC` so callers receive rows in date order.
/// Username comparison is case-insensitive. Date bounds are inclusive.
fn build_statement_query(filter: &StatementFilter) -> (String, Vec<String>) {
    let mut query = String::from(
        "SELECT txn_date, DrCr, amount, balance, user_name FROM statements WHERE 1=1",
    );
    let mut params = Vec::new();

    if let Some(username) = &filter.username {
        query.push_str(" AND LOWER(user_name) = LOWER(?)");
        params.push(username.clone());
    }

    if let Some(kind) = filter.kind {
        query.push_str(" AND DrCr = ?");
        params.push(kind.as_flag().to_owned());
    }

    if let Some(start_date) = filter.start_date {
        query.push_str(" AND txn_date >= ?");
        params.push(start_date.to_string());
    }

    if let Some(end_date) = filter.end_date {
        query.push_str(" AND txn_date <= ?");
        params.push(end_date.to_string());
    }

    query.push_str(" ORDER BY txn_date ASC");

    (query, params)
}

/// Get the statement rows matching `filter`, ordered by date ascending.
///
/// All matching rows are returned; there is no pagination or limit.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Statement row mapping fails
pub fn get_statements(
    filter: &StatementFilter,
    connection: &Connection,
) -> Result<Vec<Statement>, Error> {
    let (query, params) = build_statement_query(filter);

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), |row| {
            Ok(Statement {
                txn_date: row.get(0)?,
                flag: row.get(1)?,
                amount: row.get(2)?,
                balance: row.get(3)?,
                user_name: row.get(4)?,
            })
        })?
        .map(|statement_result| statement_result.map_err(Error::SqlError))
        .collect()
}
