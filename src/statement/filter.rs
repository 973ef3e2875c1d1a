//! Filter criteria for querying the statements table.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use super::models::TransactionKind;

/// The date format used by the dashboard's date inputs.
const FORM_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// The criteria used to select statement rows.
///
/// Every field is optional. A field that is `None` places no restriction on
/// the result set, so the default filter selects every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementFilter {
    /// Only match rows for this account holder (case-insensitive).
    pub username: Option<String>,
    /// Only match rows of this transaction kind.
    pub kind: Option<TransactionKind>,
    /// Only match rows on or after this date.
    pub start_date: Option<Date>,
    /// Only match rows on or before this date.
    pub end_date: Option<Date>,
}

impl StatementFilter {
    /// Build a filter from the raw, optional form values submitted with a
    /// dashboard request.
    ///
    /// Values that cannot be used are silently dropped rather than reported
    /// as errors:
    /// - an empty or whitespace-only username becomes no username filter,
    /// - a type other than `Db` or `Cr` becomes no type filter,
    /// - a date that does not parse as `YYYY-MM-DD` becomes no date bound.
    pub fn from_raw(
        username: Option<&str>,
        tr_type: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        let kind = tr_type.and_then(TransactionKind::from_flag);

        Self {
            username,
            kind,
            start_date: start_date.and_then(parse_form_date),
            end_date: end_date.and_then(parse_form_date),
        }
    }
}

fn parse_form_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    match Date::parse(raw, &FORM_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!("ignoring date filter {raw:?}: {error}");
            None
        }
    }
}
