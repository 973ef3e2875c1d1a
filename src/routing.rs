//! Application router configuration.

use axum::{
    Router,
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    charts_page::get_charts_page,
    dashboard::{get_dashboard_page, post_dashboard_page},
    endpoints,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
///
/// The dashboard answers both GET and POST on the root route so that the
/// first page load and filter submissions share one handler path. Chart
/// images are served straight out of the artifact directory.
pub fn build_router(state: AppState) -> Router {
    let chart_images = ServeDir::new(&state.chart_dir);

    Router::new()
        .route(
            endpoints::ROOT,
            get(get_dashboard_page).post(post_dashboard_page),
        )
        .route(endpoints::CHARTS_VIEW, get(get_charts_page))
        .nest_service(endpoints::CHART_IMAGES, chart_images)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{AppState, Statement, build_router, create_statement};

    fn temp_chart_dir(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bankdash_routing_{test_name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        dir
    }

    fn get_test_server(test_name: &str) -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, temp_chart_dir(test_name)).unwrap();

        {
            let connection = state.db_connection.lock().unwrap();
            create_statement(
                &Statement {
                    txn_date: date!(2025 - 01 - 01),
                    flag: "Db".to_owned(),
                    amount: 25.0,
                    balance: 975.0,
                    user_name: "alice".to_owned(),
                },
                &connection,
            )
            .unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn dashboard_route_serves_the_dashboard() {
        let server = get_test_server("dashboard");

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("Bankdash"));
    }

    #[tokio::test]
    async fn dashboard_route_accepts_form_posts() {
        let server = get_test_server("dashboard_post");

        let response = server
            .post("/")
            .form(&[("username", "alice"), ("window", "3")])
            .await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn charts_route_rejects_foreign_names() {
        let server = get_test_server("charts_reject");

        let response = server
            .get("/charts")
            .add_query_param("line_chart", "../secrets.txt")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_routes_return_not_found() {
        let server = get_test_server("not_found");

        let response = server.get("/definitely-not-a-page").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
