//! Defines the core data models for bank statement rows.

use time::Date;

/// Whether a transaction took money out of an account or put money in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Money left the account.
    Debit,
    /// Money entered the account.
    Credit,
}

impl TransactionKind {
    /// Parse the `DrCr` column value into a transaction kind.
    ///
    /// Only the exact flags `"Db"` and `"Cr"` are recognized; anything else
    /// returns `None`. Callers decide what to do with unrecognized flags
    /// (the dashboard ignores them when filtering and tallying).
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "Db" => Some(Self::Debit),
            "Cr" => Some(Self::Credit),
            _ => None,
        }
    }

    /// The flag stored in the `DrCr` column for this kind.
    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Debit => "Db",
            Self::Credit => "Cr",
        }
    }

    /// The human-readable name shown in tables, chart labels, and legends.
    pub fn label(self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
        }
    }
}

/// A single row of a bank statement.
///
/// Rows are read-only: the dashboard fetches them fresh for each request and
/// discards them once the page and charts have been rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// When the transaction happened.
    pub txn_date: Date,
    /// The raw `DrCr` column value.
    ///
    /// Kept as stored so that rows with flags other than `Db`/`Cr` still
    /// appear in the table and the balance charts. Use [Statement::kind] to
    /// classify the flag.
    pub flag: String,
    /// The amount of money that moved in this transaction.
    pub amount: f64,
    /// The account balance after this transaction.
    pub balance: f64,
    /// The name of the account holder.
    pub user_name: String,
}

impl Statement {
    /// Classify this row's `DrCr` flag, if it is a recognized flag.
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::from_flag(&self.flag)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{Statement, TransactionKind};

    #[test]
    fn from_flag_parses_exact_flags_only() {
        assert_eq!(TransactionKind::from_flag("Db"), Some(TransactionKind::Debit));
        assert_eq!(TransactionKind::from_flag("Cr"), Some(TransactionKind::Credit));
        assert_eq!(TransactionKind::from_flag("db"), None);
        assert_eq!(TransactionKind::from_flag("CR"), None);
        assert_eq!(TransactionKind::from_flag("Withdrawal"), None);
        assert_eq!(TransactionKind::from_flag(""), None);
    }

    #[test]
    fn flags_round_trip() {
        for kind in [TransactionKind::Debit, TransactionKind::Credit] {
            assert_eq!(TransactionKind::from_flag(kind.as_flag()), Some(kind));
        }
    }

    #[test]
    fn statement_kind_classifies_raw_flag() {
        let statement = Statement {
            txn_date: date!(2025 - 01 - 01),
            flag: "Cr".to_owned(),
            amount: 100.0,
            balance: 100.0,
            user_name: "alice".to_owned(),
        };

        assert_eq!(statement.kind(), Some(TransactionKind::Credit));
    }
}
