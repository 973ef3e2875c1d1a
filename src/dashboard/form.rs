//! The dashboard's filter form and its coercion rules.

use serde::Deserialize;

use crate::statement::StatementFilter;

/// The moving-average window used when the form does not supply a usable one.
pub(super) const DEFAULT_WINDOW: usize = 7;

/// The filter form submitted with a dashboard request.
///
/// Every field is optional so that both the first page load (no form data at
/// all) and submissions with blank inputs deserialize cleanly. The raw
/// strings are normalized by [DashboardForm::filter] and
/// [DashboardForm::effective_window].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardForm {
    /// Account holder name to filter by.
    pub username: Option<String>,
    /// Transaction type to filter by, `Db` or `Cr`.
    pub tr_type: Option<String>,
    /// Start of the date range, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// End of the date range, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Moving-average window in entries.
    pub window: Option<String>,
}

impl DashboardForm {
    /// Build the statement filter for this form's values.
    pub(super) fn filter(&self) -> StatementFilter {
        StatementFilter::from_raw(
            self.username.as_deref(),
            self.tr_type.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }

    /// The moving-average window to use for this request.
    ///
    /// A missing value, anything that does not parse as an integer, and any
    /// value below one all coerce to [DEFAULT_WINDOW]. The result is always
    /// at least one.
    pub(super) fn effective_window(&self) -> usize {
        match self.window.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_WINDOW,
            Some(raw) => match raw.parse::<i64>() {
                Ok(window) if window >= 1 => window as usize,
                Ok(_) | Err(_) => DEFAULT_WINDOW,
            },
        }
    }
}
