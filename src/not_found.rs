//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Route handler for paths that do not match any route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get the response for the 404 not found page.
pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Page Not Found",
            "404",
            "Sorry, we can't find that page.",
            "You'll find lots to explore on the dashboard.",
        ),
    )
        .into_response()
}
