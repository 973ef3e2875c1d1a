//! The app's route URIs.

/// The dashboard page, which is also the root route.
pub const ROOT: &str = "/";
/// The page that re-displays a set of previously generated charts.
pub const CHARTS_VIEW: &str = "/charts";
/// The route that serves generated chart images from the artifact directory.
pub const CHART_IMAGES: &str = "/chart-images";
/// The route for static files.
pub const STATIC: &str = "/static";
