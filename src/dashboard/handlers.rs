//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for the dashboard page (GET and POST)
//! - HTML view functions for the filter form, charts, and statements table
//! - The state type used by the handlers

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    statement::{Statement, TransactionKind, get_statements},
};

use super::{
    charts::{ChartArtifact, ChartKind, generate_charts},
    form::DashboardForm,
};

const GENERATED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second] UTC");

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection and the chart artifact directory.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection holding the statements table.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory chart images are written to.
    pub chart_dir: PathBuf,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            chart_dir: state.chart_dir.clone(),
        }
    }
}

/// Display the dashboard with no filters applied.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    render_dashboard(&state, DashboardForm::default())
}

/// Display the dashboard filtered by the submitted form.
pub async fn post_dashboard_page(
    State(state): State<DashboardState>,
    Form(form): Form<DashboardForm>,
) -> Result<Response, Error> {
    render_dashboard(&state, form)
}

fn render_dashboard(state: &DashboardState, form: DashboardForm) -> Result<Response, Error> {
    let window = form.effective_window();
    let filter = form.filter();

    let statements = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_statements(&filter, &connection)
            .inspect_err(|error| tracing::error!("could not get statements: {error}"))?
    };

    // The lock is released before chart rendering, which only needs the rows.
    let artifacts = generate_charts(&statements, window, &state.chart_dir)
        .inspect_err(|error| tracing::error!("could not generate charts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::ROOT);

    match artifacts {
        Some(artifacts) => {
            Ok(dashboard_view(nav_bar, &form, window, &statements, &artifacts).into_response())
        }
        None => Ok(dashboard_no_data_view(nav_bar, &form, window).into_response()),
    }
}

/// Build the URL for the charts viewer page displaying `artifacts`.
fn charts_viewer_url(artifacts: &[ChartArtifact; 3]) -> Option<String> {
    serde_urlencoded::to_string([
        ("line_chart", artifacts[0].filename.as_str()),
        ("moving_avg_chart", artifacts[1].filename.as_str()),
        ("pie_chart", artifacts[2].filename.as_str()),
    ])
    .inspect_err(|error| tracing::error!("could not encode the charts viewer link: {error}"))
    .ok()
    .map(|query| format!("{}?{query}", endpoints::CHARTS_VIEW))
}

fn chart_alt_text(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Line => "Line chart of the account balance over time",
        ChartKind::MovingAvg => "The account balance overlaid with its moving average",
        ChartKind::Pie => "Pie chart of debit vs credit transaction counts",
    }
}

/// Renders the dashboard page when the filters matched no statements.
///
/// The filter form is still shown so the user can widen their filters.
fn dashboard_no_data_view(nav_bar: NavBar, form: &DashboardForm, window: usize) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            (filter_form(form, window))

            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "No statements matched your filters, so there are no charts to
                show. Try widening the date range or clearing the filters."
            }
        }
    );

    base("Dashboard", &content)
}

/// Renders the main dashboard page with the filter form, charts, and the
/// statements table.
fn dashboard_view(
    nav_bar: NavBar,
    form: &DashboardForm,
    window: usize,
    statements: &[Statement],
    artifacts: &[ChartArtifact; 3],
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class=(PAGE_CONTAINER_STYLE)
        {
            (filter_form(form, window))

            (charts_view(artifacts))

            (statements_table(statements))
        }
    );

    base("Dashboard", &content)
}

/// Renders the filter form, pre-filled with the submitted values.
fn filter_form(form: &DashboardForm, window: usize) -> Markup {
    let username = form.username.as_deref().unwrap_or_default();
    let tr_type = form.tr_type.as_deref().unwrap_or_default();
    let start_date = form.start_date.as_deref().unwrap_or_default();
    let end_date = form.end_date.as_deref().unwrap_or_default();

    html!(
        form
            method="post"
            action=(endpoints::ROOT)
            class="w-full mb-6 bg-gray-50 dark:bg-gray-800 p-4 rounded-lg"
        {
            div class="grid grid-cols-2 md:grid-cols-5 gap-3 items-end"
            {
                div
                {
                    label for="username" class=(FORM_LABEL_STYLE) { "Name" }
                    input
                        type="text"
                        name="username"
                        id="username"
                        placeholder="Any account holder"
                        value=(username)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="tr_type" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="tr_type" id="tr_type" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" selected[tr_type != "Db" && tr_type != "Cr"] { "All" }
                        option value="Db" selected[tr_type == "Db"] { "Debit" }
                        option value="Cr" selected[tr_type == "Cr"] { "Credit" }
                    }
                }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                    input
                        type="date"
                        name="start_date"
                        id="start_date"
                        value=(start_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                    input
                        type="date"
                        name="end_date"
                        id="end_date"
                        value=(end_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="window" class=(FORM_LABEL_STYLE) { "Moving average window" }
                    input
                        type="number"
                        name="window"
                        id="window"
                        min="1"
                        value=(window)
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply filters" }
        }
    )
}

/// Renders the chart images with a link to the standalone charts page.
fn charts_view(artifacts: &[ChartArtifact; 3]) -> Markup {
    let generated_at = artifacts[0]
        .generated_at
        .format(&GENERATED_AT_FORMAT)
        .unwrap_or_default();

    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for artifact in artifacts {
                    figure class="rounded bg-white p-2"
                    {
                        img
                            src=(format!("{}/{}", endpoints::CHART_IMAGES, artifact.filename))
                            alt=(chart_alt_text(artifact.kind))
                            class="w-full";
                    }
                }
            }

            p class="text-sm text-gray-600 dark:text-gray-400 mt-2"
            {
                "Charts generated at " (generated_at) "."

                @if let Some(viewer_url) = charts_viewer_url(artifacts) {
                    " " (link(&viewer_url, "Open the charts on their own page."))
                }
            }
        }
    )
}

/// Renders the statement rows as a table.
fn statements_table(statements: &[Statement]) -> Markup {
    html!(
        section class="w-full overflow-x-auto"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th class=(TABLE_CELL_STYLE) { "Date" }
                        th class=(TABLE_CELL_STYLE) { "Type" }
                        th class=(TABLE_CELL_STYLE) { "Amount" }
                        th class=(TABLE_CELL_STYLE) { "Balance" }
                        th class=(TABLE_CELL_STYLE) { "User" }
                    }
                }

                tbody
                {
                    @for statement in statements {
                        tr data-statement-row="true" class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (statement.txn_date) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @match statement.kind() {
                                    Some(kind) => { (kind.label()) }
                                    None => { (statement.flag) }
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(statement.amount)) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(statement.balance)) }
                            td class=(TABLE_CELL_STYLE) { (statement.user_name) }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use axum::{Form, extract::State, http::StatusCode, response::Response};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::{Date, macros::date};

    use crate::{
        dashboard::form::DashboardForm,
        db::{create_statement, initialize},
        statement::Statement,
    };

    use super::{DashboardState, get_dashboard_page, post_dashboard_page};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn temp_chart_dir(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bankdash_dashboard_{test_name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        dir
    }

    fn statement(txn_date: Date, flag: &str, balance: f64, user_name: &str) -> Statement {
        Statement {
            txn_date,
            flag: flag.to_owned(),
            amount: 25.0,
            balance,
            user_name: user_name.to_owned(),
        }
    }

    fn get_test_state(conn: Connection, test_name: &str) -> DashboardState {
        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
            chart_dir: temp_chart_dir(test_name),
        }
    }

    async fn parse_html(response: Response) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn statement_row_dates(html: &Html) -> Vec<String> {
        let row_selector = Selector::parse("tbody tr[data-statement-row='true']").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        html.select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .next()
                    .expect("statement row should have a date cell")
                    .text()
                    .collect::<String>()
                    .trim()
                    .to_owned()
            })
            .collect()
    }

    #[track_caller]
    fn chart_image_sources(html: &Html) -> Vec<String> {
        let img_selector = Selector::parse("#charts img").unwrap();

        html.select(&img_selector)
            .map(|img| {
                img.value()
                    .attr("src")
                    .expect("chart image missing src")
                    .to_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn dashboard_page_shows_all_rows_in_date_order() {
        let conn = get_test_connection();

        // Inserted out of date order on purpose.
        create_statement(&statement(date!(2025 - 03 - 01), "Db", 75.0, "alice"), &conn).unwrap();
        create_statement(&statement(date!(2025 - 01 - 01), "Cr", 100.0, "bob"), &conn).unwrap();
        create_statement(&statement(date!(2025 - 02 - 01), "Cr", 50.0, "alice"), &conn).unwrap();

        let state = get_test_state(conn, "all_rows");
        let response = get_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        assert_eq!(
            statement_row_dates(&html),
            vec!["2025-01-01", "2025-02-01", "2025-03-01"]
        );
    }

    #[tokio::test]
    async fn dashboard_page_embeds_three_generated_charts() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "Db", 100.0, "alice"), &conn).unwrap();
        create_statement(&statement(date!(2025 - 01 - 02), "Cr", 150.0, "alice"), &conn).unwrap();

        let state = get_test_state(conn, "three_charts");
        let chart_dir = state.chart_dir.clone();
        let response = get_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        let sources = chart_image_sources(&html);
        assert_eq!(sources.len(), 3, "got chart images {sources:?}");
        assert!(sources[0].starts_with("/chart-images/line_chart_"));
        assert!(sources[1].starts_with("/chart-images/moving_avg_"));
        assert!(sources[2].starts_with("/chart-images/pie_chart_"));

        // The images the page refers to exist on disk.
        for source in sources {
            let filename = source.strip_prefix("/chart-images/").unwrap();
            assert!(
                chart_dir.join(filename).is_file(),
                "chart image {filename} not written"
            );
        }
    }

    #[tokio::test]
    async fn dashboard_page_links_to_charts_viewer() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "Db", 100.0, "alice"), &conn).unwrap();

        let state = get_test_state(conn, "viewer_link");
        let response = get_dashboard_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let link_selector = Selector::parse("a").unwrap();

        let viewer_link = html
            .select(&link_selector)
            .filter_map(|link| link.value().attr("href"))
            .find(|href| href.starts_with("/charts?"))
            .expect("No charts viewer link found");

        assert!(viewer_link.contains("line_chart=line_chart_"), "got {viewer_link}");
        assert!(viewer_link.contains("moving_avg_chart=moving_avg_"), "got {viewer_link}");
        assert!(viewer_link.contains("pie_chart=pie_chart_"), "got {viewer_link}");
    }

    #[tokio::test]
    async fn dashboard_page_shows_prompt_text_on_no_data() {
        let conn = get_test_connection();

        let state = get_test_state(conn, "no_data");
        let response = get_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);
        assert!(chart_image_sources(&html).is_empty());

        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("No statements matched your filters"),
            "missing the no-data prompt, got {text}"
        );
    }

    #[tokio::test]
    async fn posted_filters_restrict_the_table() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "Db", 100.0, "alice"), &conn).unwrap();
        create_statement(&statement(date!(2025 - 01 - 02), "Cr", 150.0, "bob"), &conn).unwrap();
        create_statement(&statement(date!(2025 - 01 - 03), "Cr", 50.0, "ALICE"), &conn).unwrap();

        let form = DashboardForm {
            username: Some("Alice".to_owned()),
            ..Default::default()
        };

        let state = get_test_state(conn, "posted_filters");
        let response = post_dashboard_page(State(state), Form(form)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        // Case-insensitive match on the username keeps both of alice's rows.
        assert_eq!(statement_row_dates(&html), vec!["2025-01-01", "2025-01-03"]);
    }

    #[tokio::test]
    async fn posted_form_values_are_kept_in_the_filter_inputs() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "Db", 100.0, "alice"), &conn).unwrap();

        let form = DashboardForm {
            username: Some("alice".to_owned()),
            tr_type: Some("Db".to_owned()),
            window: Some("3".to_owned()),
            ..Default::default()
        };

        let state = get_test_state(conn, "sticky_form");
        let response = post_dashboard_page(State(state), Form(form)).await.unwrap();

        let html = parse_html(response).await;

        let username_selector = Selector::parse("input[name='username']").unwrap();
        let username_input = html
            .select(&username_selector)
            .next()
            .expect("No username input found");
        assert_eq!(username_input.value().attr("value"), Some("alice"));

        let window_selector = Selector::parse("input[name='window']").unwrap();
        let window_input = html
            .select(&window_selector)
            .next()
            .expect("No window input found");
        assert_eq!(window_input.value().attr("value"), Some("3"));

        let selected_selector = Selector::parse("option[selected]").unwrap();
        let selected_option = html
            .select(&selected_selector)
            .next()
            .expect("No selected type option found");
        assert_eq!(selected_option.value().attr("value"), Some("Db"));
    }

    #[tokio::test]
    async fn invalid_window_falls_back_to_default_in_the_form() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "Db", 100.0, "alice"), &conn).unwrap();

        let form = DashboardForm {
            window: Some("zero".to_owned()),
            ..Default::default()
        };

        let state = get_test_state(conn, "invalid_window");
        let response = post_dashboard_page(State(state), Form(form)).await.unwrap();

        let html = parse_html(response).await;
        let window_selector = Selector::parse("input[name='window']").unwrap();
        let window_input = html
            .select(&window_selector)
            .next()
            .expect("No window input found");

        assert_eq!(window_input.value().attr("value"), Some("7"));
    }

    #[tokio::test]
    async fn rows_with_unknown_flags_show_their_raw_flag() {
        let conn = get_test_connection();
        create_statement(&statement(date!(2025 - 01 - 01), "XX", 100.0, "alice"), &conn).unwrap();

        let state = get_test_state(conn, "unknown_flag");
        let response = get_dashboard_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let text = html.root_element().text().collect::<String>();

        assert!(text.contains("XX"), "raw flag should be shown, got {text}");
    }
}
