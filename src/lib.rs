//! Bankdash is a web app for exploring bank statement data.
//!
//! It serves an HTML dashboard that filters a table of statement rows by
//! user, transaction type, and date range, and renders three charts (balance
//! over time, a moving-average overlay, and a debit/credit split) as SVG
//! images on disk.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod charts_page;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod navigation;
mod not_found;
mod routing;
mod statement;

pub use app_state::AppState;
pub use db::{create_statement, initialize as initialize_db};
pub use routing::build_router;
pub use statement::{Statement, TransactionKind};

use crate::html::error_view;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A chart image could not be written to the artifact directory.
    ///
    /// Holds the artifact filename and the reason the write failed.
    #[error("could not write chart image {0}: {1}")]
    ChartWrite(String, String),

    /// The charts viewer was asked to display a filename that does not match
    /// the naming pattern of charts generated by this app.
    #[error("{0:?} is not the name of a chart generated by this app")]
    InvalidArtifactName(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidArtifactName(name) => (
                StatusCode::BAD_REQUEST,
                error_view(
                    "Invalid Chart Name",
                    "400",
                    "That is not one of our charts.",
                    &format!(
                        "The chart name {name:?} does not match any chart generated by this app. \
                        Follow a link from the dashboard instead of editing the URL."
                    ),
                ),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_view(
                        "Internal Server Error",
                        "500",
                        "Sorry, something went wrong.",
                        "Try again later or check the server logs.",
                    ),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn invalid_artifact_name_renders_bad_request() {
        let response = Error::InvalidArtifactName("evil.svg".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_errors_render_internal_server_error() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
