//! Dashboard module
//!
//! Provides the main page: a filterable statements table plus three charts
//! (balance over time, moving-average overlay, debit/credit split) rendered
//! as SVG images in the artifact directory.

mod analysis;
mod charts;
mod form;
mod handlers;

pub use handlers::{DashboardState, get_dashboard_page, post_dashboard_page};

pub(crate) use charts::{ChartKind, is_valid_artifact_name};
