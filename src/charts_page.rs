//! The standalone charts page.
//!
//! Re-displays three previously generated chart images named via query
//! parameters. Names are validated against the artifact naming pattern
//! before they are rendered, so the page can only ever embed files minted by
//! the chart generator. Whether a named file still exists is not checked; a
//! stale link simply renders a broken image, consistent with chart artifacts
//! being ephemeral.

use axum::{
    extract::Query,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    dashboard::{ChartKind, is_valid_artifact_name},
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

/// The query parameters naming the charts to display.
#[derive(Debug, Default, Deserialize)]
pub struct ChartsQuery {
    /// The filename of a balance line chart.
    pub line_chart: Option<String>,
    /// The filename of a moving-average chart.
    pub moving_avg_chart: Option<String>,
    /// The filename of a debit/credit pie chart.
    pub pie_chart: Option<String>,
}

/// Display a page embedding the three named chart images.
///
/// # Errors
/// Returns [Error::InvalidArtifactName] for any supplied name that does not
/// match the artifact naming pattern for its chart kind.
pub async fn get_charts_page(Query(query): Query<ChartsQuery>) -> Result<Response, Error> {
    let line_chart = validated_name(ChartKind::Line, query.line_chart.as_deref())?;
    let moving_avg_chart = validated_name(ChartKind::MovingAvg, query.moving_avg_chart.as_deref())?;
    let pie_chart = validated_name(ChartKind::Pie, query.pie_chart.as_deref())?;

    Ok(charts_view(&[
        ("Balance over time", line_chart),
        ("Moving average", moving_avg_chart),
        ("Debit vs credit", pie_chart),
    ])
    .into_response())
}

/// Check that `name`, when present, matches the artifact pattern for `kind`.
fn validated_name(kind: ChartKind, name: Option<&str>) -> Result<Option<&str>, Error> {
    match name {
        None => Ok(None),
        Some(name) if is_valid_artifact_name(kind, name) => Ok(Some(name)),
        Some(name) => {
            tracing::warn!("rejecting chart name {name:?}");
            Err(Error::InvalidArtifactName(name.to_owned()))
        }
    }
}

/// Renders the charts page.
///
/// Each entry is a chart caption and an optional validated filename; missing
/// filenames render a placeholder instead of an image.
fn charts_view(charts: &[(&str, Option<&str>)]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CHARTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full mx-auto mb-4"
            {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @for (caption, filename) in charts {
                        figure class="rounded bg-white p-2"
                        {
                            @match filename {
                                Some(filename) => {
                                    img
                                        src=(format!("{}/{}", endpoints::CHART_IMAGES, filename))
                                        alt=(caption)
                                        class="w-full";
                                }
                                None => {
                                    p class="text-gray-600 p-4" { "No " (caption) " chart was requested." }
                                }
                            }

                            figcaption class="text-sm text-gray-600 p-2" { (caption) }
                        }
                    }
                }
            }

            p
            {
                (link(endpoints::ROOT, "Back to the dashboard"))
            }
        }
    );

    base("Charts", &content)
}
