//! The bank statement domain: the row model, filter criteria, and the query
//! that fetches filtered rows from the statements table.

mod filter;
mod models;
mod query;

pub use filter::StatementFilter;
pub use models::{Statement, TransactionKind};
pub use query::get_statements;
