//! Statement data analysis for the dashboard charts.
//!
//! Provides the moving average of the balance series and the debit/credit
//! tally behind the pie chart.

use crate::statement::{Statement, TransactionKind};

/// The number of debit and credit rows in a set of statements.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct KindTally {
    pub debit: usize,
    pub credit: usize,
}

impl KindTally {
    /// The number of rows counted in either bucket.
    pub fn total(&self) -> usize {
        self.debit + self.credit
    }
}

/// Compute the simple moving average of the balance series.
///
/// The average at position `i` covers the trailing `window` entries with a
/// minimum of one period: it is the mean of the balances at positions
/// `max(0, i - window + 1)..=i`. The first point's average is just itself,
/// the window expands until full, then slides.
///
/// `statements` must already be sorted by date; `window` must be at least 1.
pub(super) fn moving_average(statements: &[Statement], window: usize) -> Vec<f64> {
    debug_assert!(window >= 1, "the moving-average window must be positive");

    statements
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let trailing = &statements[start..=i];
            let sum: f64 = trailing.iter().map(|statement| statement.balance).sum();

            sum / trailing.len() as f64
        })
        .collect()
}

/// Count how many statements are debits and how many are credits.
///
/// Rows whose `DrCr` flag is anything other than `Db` or `Cr` are excluded
/// from both counts.
pub(super) fn tally_by_kind(statements: &[Statement]) -> KindTally {
    let mut tally = KindTally::default();

    for statement in statements {
        match statement.kind() {
            Some(TransactionKind::Debit) => tally.debit += 1,
            Some(TransactionKind::Credit) => tally.credit += 1,
            None => {}
        }
    }

    tally
}
